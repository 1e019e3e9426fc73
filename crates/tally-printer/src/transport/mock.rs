//! # Mock Transport
//!
//! A scriptable in-memory transport for tests.
//!
//! ## Capabilities
//! - Fixed device list returned by every scan (changeable at runtime)
//! - Failure injection per operation ([`MockTransport::fail`])
//! - Holding a call open mid-flight ([`MockTransport::hold`]) so a test can
//!   poke the manager while a transport call is pending
//! - Records every receipt sent and counts calls per operation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{TransportError, TransportResult};
use crate::transport::{DeviceDescriptor, DeviceId, PrinterTransport};

/// Transport operations the mock can script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Initialize,
    ListDevices,
    Connect,
    Disconnect,
    SendText,
}

/// Handle for a held transport call.
#[derive(Clone)]
pub struct MockHold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl MockHold {
    /// Resolves once the held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the held call finish.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct MockInner {
    devices: Vec<DeviceDescriptor>,
    failures: HashMap<MockOp, TransportError>,
    holds: HashMap<MockOp, MockHold>,
    calls: HashMap<MockOp, usize>,
    bound: Option<DeviceId>,
    sent: Vec<String>,
}

/// In-memory transport. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        let transport = MockTransport::default();
        transport.lock().devices = devices;
        transport
    }

    /// Mock with one printer per id, named `Printer N`.
    pub fn with_device_ids(ids: &[&str]) -> Self {
        Self::new(
            ids.iter()
                .enumerate()
                .map(|(i, id)| DeviceDescriptor::new(*id, format!("Printer {}", i + 1)))
                .collect(),
        )
    }

    /// Replaces what the next scan will find.
    pub fn set_devices(&self, devices: Vec<DeviceDescriptor>) {
        self.lock().devices = devices;
    }

    /// Makes every call to `op` fail until [`MockTransport::clear_failure`].
    pub fn fail(&self, op: MockOp, error: TransportError) {
        self.lock().failures.insert(op, error);
    }

    pub fn clear_failure(&self, op: MockOp) {
        self.lock().failures.remove(&op);
    }

    /// Holds the next call to `op` open until the returned handle is released.
    pub fn hold(&self, op: MockOp) -> MockHold {
        let hold = MockHold {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.lock().holds.insert(op, hold.clone());
        hold
    }

    /// Number of calls made to `op` so far.
    pub fn calls(&self, op: MockOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Every receipt successfully sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Device the mock believes it is bound to.
    pub fn bound(&self) -> Option<DeviceId> {
        self.lock().bound.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts the call, waits on a hold if one is set, then reports the
    /// scripted failure (if any).
    async fn enter(&self, op: MockOp) -> TransportResult<()> {
        let hold = {
            let mut inner = self.lock();
            *inner.calls.entry(op).or_insert(0) += 1;
            inner.holds.remove(&op)
        };

        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        match self.lock().failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PrinterTransport for MockTransport {
    async fn initialize(&self) -> TransportResult<()> {
        self.enter(MockOp::Initialize).await
    }

    async fn list_devices(&self) -> TransportResult<Vec<DeviceDescriptor>> {
        self.enter(MockOp::ListDevices).await?;
        Ok(self.lock().devices.clone())
    }

    async fn connect(&self, device_id: &DeviceId) -> TransportResult<()> {
        self.enter(MockOp::Connect).await?;
        self.lock().bound = Some(device_id.clone());
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        let result = self.enter(MockOp::Disconnect).await;
        self.lock().bound = None;
        result
    }

    async fn send_text(&self, text: &str) -> TransportResult<()> {
        self.enter(MockOp::SendText).await?;
        self.lock().sent.push(text.to_string());
        Ok(())
    }
}
