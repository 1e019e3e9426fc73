//! # Bluetooth RFCOMM Transport
//!
//! Talks to Bluetooth SPP receipt printers through the Linux RFCOMM tty
//! layer.
//!
//! ## Bluetooth Setup (Linux)
//!
//! The printer must be paired and bound before the app can see it:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# pair 66:22:8A:1B:00:C4
//! $ sudo rfcomm bind 0 66:22:8A:1B:00:C4 1
//! # creates /dev/rfcomm0
//! ```
//!
//! Pairing itself is out of scope here; a "scan" lists what is already bound.
//!
//! ## Scan Source
//! ```text
//! /proc/net/rfcomm
//! ┌─────────────────────────────────────────────────────────┐
//! │ rfcomm0: 66:22:8A:1B:00:C4 channel 1 clean              │ ──► DeviceDescriptor {
//! │ rfcomm1: 00:11:62:AA:BB:CC channel 1 closed             │       device_id: "66:22:8A:1B:00:C4",
//! └─────────────────────────────────────────────────────────┘       display_name: "rfcomm0 (channel 1)" }
//! ```
//!
//! ## Chunked Writes
//! Receipts are written in chunks (4096 bytes by default) and flushed at
//! the end, so a long receipt never overruns the Bluetooth buffer in one
//! write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RfcommSettings;
use crate::error::{TransportError, TransportResult};
use crate::transport::{DeviceDescriptor, DeviceId, PrinterTransport};

// =============================================================================
// RFCOMM Table Parsing
// =============================================================================

/// One bound RFCOMM tty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfcommBinding {
    /// Device node name, e.g. `rfcomm0`.
    pub node: String,
    /// Remote printer address, upper-cased.
    pub address: String,
    /// RFCOMM channel, when the table lists it.
    pub channel: Option<u8>,
}

impl RfcommBinding {
    fn descriptor(&self) -> DeviceDescriptor {
        let display_name = match self.channel {
            Some(channel) => format!("{} (channel {})", self.node, channel),
            None => self.node.clone(),
        };
        DeviceDescriptor::new(self.address.clone(), display_name)
    }
}

/// Validates a Bluetooth MAC address (`XX:XX:XX:XX:XX:XX`).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parses the kernel RFCOMM table.
///
/// Each useful line starts with `rfcommN:`. The remote address is the last
/// non-zero MAC on the line (some kernels print the local adapter first).
/// Lines without a usable address are skipped.
pub fn parse_rfcomm_table(contents: &str) -> Vec<RfcommBinding> {
    const ANY_ADDRESS: &str = "00:00:00:00:00:00";

    contents
        .lines()
        .filter_map(|line| {
            let (node, rest) = line.trim().split_once(':')?;
            let node = node.trim();
            if !node.starts_with("rfcomm") || node.len() == "rfcomm".len() {
                return None;
            }

            let tokens: Vec<&str> = rest.split_whitespace().collect();
            let address = tokens
                .iter()
                .rev()
                .find(|t| is_valid_mac(t) && **t != ANY_ADDRESS)?
                .to_uppercase();
            let channel = tokens
                .iter()
                .position(|t| *t == "channel")
                .and_then(|i| tokens.get(i + 1))
                .and_then(|c| c.parse().ok());

            Some(RfcommBinding {
                node: node.to_string(),
                address,
                channel,
            })
        })
        .collect()
}

// =============================================================================
// Transport
// =============================================================================

/// Printer transport over `/dev/rfcommN`.
pub struct RfcommTransport {
    table_path: PathBuf,
    device_dir: PathBuf,
    chunk_size: usize,
    /// Device node per address, from the last listing.
    nodes: Mutex<HashMap<DeviceId, PathBuf>>,
    /// Open tty of the bound printer.
    port: Mutex<Option<File>>,
}

impl RfcommTransport {
    pub fn new(settings: &RfcommSettings) -> Self {
        RfcommTransport {
            table_path: settings.table_path.clone(),
            device_dir: settings.device_dir.clone(),
            chunk_size: settings.chunk_size.max(1),
            nodes: Mutex::new(HashMap::new()),
            port: Mutex::new(None),
        }
    }

    async fn read_table(&self) -> TransportResult<String> {
        tokio::fs::read_to_string(&self.table_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TransportError::NotReady(format!(
                    "{} not found; is Bluetooth on and the rfcomm module loaded?",
                    self.table_path.display()
                )),
                _ => TransportError::from(e),
            })
    }

    fn node_path(&self, node: &str) -> PathBuf {
        self.device_dir.join(node)
    }
}

#[async_trait]
impl PrinterTransport for RfcommTransport {
    async fn initialize(&self) -> TransportResult<()> {
        self.read_table().await?;
        debug!(table = %self.table_path.display(), "RFCOMM table readable");
        Ok(())
    }

    async fn list_devices(&self) -> TransportResult<Vec<DeviceDescriptor>> {
        let contents = self.read_table().await?;

        let mut nodes = HashMap::new();
        let mut devices = Vec::new();
        for binding in parse_rfcomm_table(&contents) {
            let path = self.node_path(&binding.node);
            if !device_exists(&path).await {
                debug!(node = %binding.node, "Skipping binding without device node");
                continue;
            }
            let descriptor = binding.descriptor();
            nodes.insert(descriptor.device_id.clone(), path);
            devices.push(descriptor);
        }

        info!(count = devices.len(), "RFCOMM scan complete");
        *self.nodes.lock().await = nodes;
        Ok(devices)
    }

    async fn connect(&self, device_id: &DeviceId) -> TransportResult<()> {
        let path = self
            .nodes
            .lock()
            .await
            .get(device_id)
            .cloned()
            .ok_or_else(|| {
                TransportError::DeviceUnavailable(format!("{} is not bound to any rfcomm node", device_id))
            })?;

        let file = OpenOptions::new().write(true).open(&path).await?;
        info!(device_id = %device_id, path = %path.display(), "RFCOMM port opened");
        *self.port.lock().await = Some(file);
        Ok(())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        let Some(mut file) = self.port.lock().await.take() else {
            return Ok(());
        };
        // The handle is dropped either way; a failed flush is still reported.
        file.flush().await.map_err(TransportError::from)
    }

    async fn send_text(&self, text: &str) -> TransportResult<()> {
        let mut port = self.port.lock().await;
        let file = port
            .as_mut()
            .ok_or_else(|| TransportError::NotReady("no RFCOMM port is open".into()))?;

        let bytes = text.as_bytes();
        for chunk in bytes.chunks(self.chunk_size) {
            if let Err(e) = file.write_all(chunk).await {
                warn!(error = %e, "RFCOMM write failed");
                return Err(TransportError::Io(e.to_string()));
            }
        }
        file.flush()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        debug!(bytes = bytes.len(), "Receipt sent over RFCOMM");
        Ok(())
    }
}

async fn device_exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    fn scratch_dir() -> TempDir {
        tempdir().unwrap()
    }

    fn settings_in(dir: &Path) -> RfcommSettings {
        RfcommSettings {
            table_path: dir.join("rfcomm"),
            device_dir: dir.to_path_buf(),
            chunk_size: 8,
        }
    }

    #[test]
    fn test_valid_mac_addresses() {
        assert!(is_valid_mac("66:22:8A:1B:00:C4"));
        assert!(is_valid_mac("aa:bb:cc:dd:ee:ff"));
        assert!(!is_valid_mac("66:22:8A:1B:00"));
        assert!(!is_valid_mac("66-22-8A-1B-00-C4"));
        assert!(!is_valid_mac("GG:22:8A:1B:00:C4"));
        assert!(!is_valid_mac(""));
    }

    #[test]
    fn test_parse_rfcomm_table() {
        let table = "\
rfcomm0: 66:22:8a:1b:00:c4 channel 1 clean
rfcomm1: 00:00:00:00:00:00 00:11:62:AA:BB:CC channel 3 connected
garbage line
rfcomm2: not-a-mac channel 1 clean
";
        let bindings = parse_rfcomm_table(table);
        assert_eq!(
            bindings,
            vec![
                RfcommBinding {
                    node: "rfcomm0".to_string(),
                    address: "66:22:8A:1B:00:C4".to_string(),
                    channel: Some(1),
                },
                RfcommBinding {
                    node: "rfcomm1".to_string(),
                    address: "00:11:62:AA:BB:CC".to_string(),
                    channel: Some(3),
                },
            ]
        );
        assert_eq!(bindings[0].descriptor().display_name, "rfcomm0 (channel 1)");
    }

    #[tokio::test]
    async fn test_missing_table_is_not_ready() {
        let dir = scratch_dir();
        let transport = RfcommTransport::new(&settings_in(dir.path()));

        assert!(matches!(
            transport.initialize().await,
            Err(TransportError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_connect_and_send_in_chunks() {
        let scratch = scratch_dir();
        let dir = scratch.path();
        std::fs::write(
            dir.join("rfcomm"),
            "rfcomm0: 66:22:8A:1B:00:C4 channel 1 clean\nrfcomm7: 11:22:33:44:55:66 channel 1 clean\n",
        )
        .unwrap();
        // Stand-in for the tty node; rfcomm7 has no node and must be skipped.
        std::fs::write(dir.join("rfcomm0"), "").unwrap();

        let transport = RfcommTransport::new(&settings_in(dir));
        transport.initialize().await.unwrap();
        let devices = transport.list_devices().await.unwrap();
        assert_eq!(devices, vec![DeviceDescriptor::new("66:22:8A:1B:00:C4", "rfcomm0 (channel 1)")]);

        transport.connect(&devices[0].device_id).await.unwrap();
        transport.send_text("Beverage List\nCoke x3\n").await.unwrap();
        transport.disconnect().await.unwrap();

        let written = std::fs::read_to_string(dir.join("rfcomm0")).unwrap();
        assert_eq!(written, "Beverage List\nCoke x3\n");
    }

    #[tokio::test]
    async fn test_connect_unknown_device_is_unavailable() {
        let dir = scratch_dir();
        let transport = RfcommTransport::new(&settings_in(dir.path()));

        assert!(matches!(
            transport.connect(&DeviceId::from("66:22:8A:1B:00:C4")).await,
            Err(TransportError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_send_without_port_is_not_ready() {
        let dir = scratch_dir();
        let transport = RfcommTransport::new(&settings_in(dir.path()));

        assert!(matches!(
            transport.send_text("x").await,
            Err(TransportError::NotReady(_))
        ));
        assert!(transport.disconnect().await.is_ok());
    }
}
