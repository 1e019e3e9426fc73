//! # Spool File Transport
//!
//! Appends receipts to plain files. Each configured file is one "printer".
//! Handy on a laptop with no printer nearby, or to keep a paper-free copy
//! of what would have been printed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::SpoolSettings;
use crate::error::{TransportError, TransportResult};
use crate::transport::{DeviceDescriptor, DeviceId, PrinterTransport};

pub struct SpoolTransport {
    paths: Vec<PathBuf>,
    target: Mutex<Option<PathBuf>>,
}

impl SpoolTransport {
    pub fn new(settings: &SpoolSettings) -> Self {
        SpoolTransport {
            paths: settings.paths.clone(),
            target: Mutex::new(None),
        }
    }

    fn descriptor(path: &Path) -> DeviceDescriptor {
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        DeviceDescriptor::new(path.display().to_string(), display_name)
    }

    async fn open_append(path: &Path) -> TransportResult<tokio::fs::File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                error!(path = %path.display(), error = %e, "Failed to open spool file");
                TransportError::from(e)
            })
    }
}

#[async_trait]
impl PrinterTransport for SpoolTransport {
    async fn initialize(&self) -> TransportResult<()> {
        if self.paths.is_empty() {
            return Err(TransportError::NotReady("no spool files configured".into()));
        }
        Ok(())
    }

    async fn list_devices(&self) -> TransportResult<Vec<DeviceDescriptor>> {
        Ok(self.paths.iter().map(|p| Self::descriptor(p)).collect())
    }

    /// "Connecting" verifies the file can be opened for appending; the file
    /// is reopened for every receipt so nothing stays locked.
    async fn connect(&self, device_id: &DeviceId) -> TransportResult<()> {
        let path = self
            .paths
            .iter()
            .find(|p| p.display().to_string() == device_id.as_str())
            .cloned()
            .ok_or_else(|| TransportError::DeviceUnavailable(format!("{} is not a configured spool file", device_id)))?;

        Self::open_append(&path).await?;
        info!(path = %path.display(), "Spooling receipts to file");
        *self.target.lock().await = Some(path);
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        self.target.lock().await.take();
        Ok(())
    }

    async fn send_text(&self, text: &str) -> TransportResult<()> {
        let path = self
            .target
            .lock()
            .await
            .clone()
            .ok_or_else(|| TransportError::NotReady("no spool file selected".into()))?;

        let mut file = Self::open_append(&path).await?;
        file.write_all(text.as_bytes())
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(())
    }
}
