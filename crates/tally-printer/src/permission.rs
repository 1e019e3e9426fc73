//! # Permission Gate
//!
//! Asked before every scan: may this process use Bluetooth at all?
//!
//! On Linux the question boils down to "can we read the RFCOMM table and
//! open the device directory", which is what [`RfcommAccessGate`] probes.
//! [`StaticGate`] gives a fixed answer from config (and for tests).

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::{PermissionPolicy, RfcommSettings};

/// Answer from a permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn check(&self) -> PermissionStatus;
}

#[async_trait]
impl<G: PermissionGate + ?Sized> PermissionGate for Box<G> {
    async fn check(&self) -> PermissionStatus {
        (**self).check().await
    }
}

// =============================================================================
// Static Gate
// =============================================================================

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticGate(PermissionStatus);

impl StaticGate {
    pub fn granted() -> Self {
        StaticGate(PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        StaticGate(PermissionStatus::Denied)
    }
}

#[async_trait]
impl PermissionGate for StaticGate {
    async fn check(&self) -> PermissionStatus {
        self.0
    }
}

// =============================================================================
// RFCOMM Access Gate
// =============================================================================

/// Granted when the RFCOMM table is readable and the device directory can
/// be listed.
#[derive(Debug, Clone)]
pub struct RfcommAccessGate {
    table_path: PathBuf,
    device_dir: PathBuf,
}

impl RfcommAccessGate {
    pub fn new(settings: &RfcommSettings) -> Self {
        RfcommAccessGate {
            table_path: settings.table_path.clone(),
            device_dir: settings.device_dir.clone(),
        }
    }
}

#[async_trait]
impl PermissionGate for RfcommAccessGate {
    async fn check(&self) -> PermissionStatus {
        let table = tokio::fs::File::open(&self.table_path).await;
        let dir = tokio::fs::read_dir(&self.device_dir).await;

        match (table, dir) {
            (Ok(_), Ok(_)) => PermissionStatus::Granted,
            (table, dir) => {
                debug!(
                    table_error = ?table.err().map(|e| e.kind()),
                    dir_error = ?dir.err().map(|e| e.kind()),
                    "RFCOMM access probe failed"
                );
                PermissionStatus::Denied
            }
        }
    }
}

/// Builds the gate a [`PermissionPolicy`] asks for.
pub fn gate_for(policy: PermissionPolicy, rfcomm: &RfcommSettings) -> Box<dyn PermissionGate> {
    match policy {
        PermissionPolicy::Auto => Box::new(RfcommAccessGate::new(rfcomm)),
        PermissionPolicy::Granted => Box::new(StaticGate::granted()),
        PermissionPolicy::Denied => Box::new(StaticGate::denied()),
    }
}
