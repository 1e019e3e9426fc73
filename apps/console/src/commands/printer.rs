//! # Printer Commands
//!
//! Commands that find, bind and print to a receipt printer.
//!
//! ## Operator Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  scan ──► devices ──► connect 1 ──► preview ──► print ──► disconnect    │
//! │   │                      │                        │                     │
//! │   │ nothing found?       │ failed?                │ not connected?      │
//! │   ▼                      ▼                        ▼                     │
//! │  troubleshooting      retry hints              refused, with the        │
//! │  tips                                          next step to take        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use tally_core::ReceiptFormatter;
use tally_printer::{DeviceDescriptor, DeviceId, PrinterError};
use tracing::info;

use crate::error::{ApiError, ErrorCode};
use crate::state::{ConnectionState, LedgerState};

const NO_DEVICES_TIPS: &str = "\
No printers found.

Troubleshooting tips:
  1. Make sure Bluetooth is on
  2. Turn on your thermal printer
  3. Pair the printer and bind it first (bluetoothctl, then `rfcomm bind`)
  4. Try turning the printer off and on
  5. Make sure the printer is in discoverable mode";

/// Formats the current ledger and sends it to the bound printer.
///
/// Refused when no idle printer is bound, or when every line total is zero.
pub async fn print(
    ledger: &LedgerState,
    printer: &ConnectionState,
    formatter: &ReceiptFormatter,
    now: NaiveDateTime,
) -> Result<String, ApiError> {
    let manager = printer.manager();
    if !manager.can_print().await {
        return Err(PrinterError::NotConnected.into());
    }
    if !ledger.with_ledger(|l| l.has_nonzero_total()) {
        return Err(ApiError::new(
            ErrorCode::NothingToPrint,
            "Nothing to print yet. Enter a price and a number of cases for at least one row.",
        ));
    }

    let text = ledger.with_ledger(|l| formatter.format(l, now));
    manager.print(&text).await?;

    let device = manager
        .bound_device()
        .await
        .map(|id| id.to_string())
        .unwrap_or_default();
    info!(device_id = %device, bytes = text.len(), "Receipt sent");
    Ok(format!("Printed receipt on {} ({} bytes)", device, text.len()))
}

/// Scans for printers and lists what was found.
pub async fn scan(printer: &ConnectionState) -> Result<String, ApiError> {
    let devices = printer.manager().scan().await?;
    if devices.is_empty() {
        return Ok(NO_DEVICES_TIPS.to_string());
    }
    Ok(format!(
        "Found {} device(s):\n{}",
        devices.len(),
        render_devices(&devices, None)
    ))
}

/// Lists the devices from the last scan, marking the bound one.
pub async fn devices(printer: &ConnectionState) -> String {
    let snapshot = printer.manager().snapshot().await;
    if snapshot.known_devices.is_empty() {
        return "No devices yet. Run `scan` first.".to_string();
    }
    render_devices(&snapshot.known_devices, snapshot.state.device_id())
}

/// Connects to a device by its row in `devices`, or by its id.
pub async fn connect(printer: &ConnectionState, target: &str) -> Result<String, ApiError> {
    let manager = printer.manager();
    let known = manager.known_devices().await;
    let device = resolve_device(&known, target)?;

    manager.connect(&device).await?;

    let name = known
        .iter()
        .find(|d| d.device_id == device)
        .map(|d| d.display_name.as_str())
        .unwrap_or_default();
    Ok(format!("Connected to {} ({})", name, device))
}

/// Releases the bound printer.
pub async fn disconnect(printer: &ConnectionState) -> Result<String, ApiError> {
    let manager = printer.manager();
    let Some(device) = manager.bound_device().await else {
        manager.disconnect().await?;
        return Ok("No printer was connected.".to_string());
    };
    manager.disconnect().await?;
    Ok(format!("Disconnected from {}", device))
}

/// One-screen summary of the connection.
pub async fn status(printer: &ConnectionState) -> String {
    let snapshot = printer.manager().snapshot().await;

    let mut lines = vec![format!("Printer: {}", snapshot.state)];
    if let Some(pending) = &snapshot.pending {
        lines.push(format!("In progress: {}", pending));
    }
    lines.push(format!("Known devices: {}", snapshot.known_devices.len()));
    if let Some(error) = &snapshot.last_error {
        lines.push(format!("Last error: {}", error));
    }
    lines.push(format!(
        "Ready to print: {}",
        if snapshot.can_print() { "yes" } else { "no" }
    ));
    lines.join("\n")
}

// =============================================================================
// Helpers
// =============================================================================

/// A number within the device list is a row; anything else is an id.
fn resolve_device(known: &[DeviceDescriptor], target: &str) -> Result<DeviceId, ApiError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ApiError::usage("usage: connect <row|device-id>"));
    }

    match target.parse::<usize>() {
        Ok(row) if row >= 1 && row <= known.len() => Ok(known[row - 1].device_id.clone()),
        Ok(row) => Err(ApiError::validation(format!(
            "device {} does not exist ({} known). Run `scan` to refresh the list.",
            row,
            known.len()
        ))),
        Err(_) => Ok(DeviceId::from(target)),
    }
}

fn render_devices(devices: &[DeviceDescriptor], bound: Option<&DeviceId>) -> String {
    devices
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let marker = if Some(&device.device_id) == bound { "*" } else { " " };
            format!(
                "{} {:>2}. {:<24} {}",
                marker,
                index + 1,
                device.display_name,
                device.device_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::{ItemUpdate, Money, ReceiptLayout};
    use tally_printer::transport::mock::{MockOp, MockTransport};
    use tally_printer::{PrinterState, StaticGate, TransportError};

    const PRINTER: &str = "66:22:8A:1B:00:C4";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    fn connection(transport: &MockTransport) -> ConnectionState {
        ConnectionState::new(Box::new(transport.clone()), Box::new(StaticGate::granted()))
    }

    fn priced_ledger() -> LedgerState {
        let ledger = LedgerState::seeded(["Coke", "Sprite"]);
        let id = ledger.id_at_row("1").unwrap();
        ledger.with_ledger_mut(|l| {
            l.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(4500)));
            l.update_item(&id, ItemUpdate::Quantity(3));
        });
        ledger
    }

    #[tokio::test]
    async fn test_scan_connect_print() {
        let transport = MockTransport::with_device_ids(&[PRINTER]);
        let printer = connection(&transport);
        let formatter = ReceiptFormatter::new(ReceiptLayout::default());

        let out = scan(&printer).await.unwrap();
        assert!(out.starts_with("Found 1 device(s):"));

        let out = connect(&printer, "1").await.unwrap();
        assert_eq!(out, format!("Connected to Printer 1 ({})", PRINTER));
        assert!(devices(&printer).await.starts_with("*  1. Printer 1"));

        let out = print(&priced_ledger(), &printer, &formatter, now()).await.unwrap();
        assert!(out.starts_with(&format!("Printed receipt on {}", PRINTER)));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("135.00"));
    }

    #[tokio::test]
    async fn test_print_refused_when_not_connected() {
        let transport = MockTransport::with_device_ids(&[PRINTER]);
        let printer = connection(&transport);
        let formatter = ReceiptFormatter::new(ReceiptLayout::default());

        let err = print(&priced_ledger(), &printer, &formatter, now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotConnected);
        assert_eq!(transport.calls(MockOp::SendText), 0);
    }

    #[tokio::test]
    async fn test_print_refused_when_total_is_zero() {
        let transport = MockTransport::with_device_ids(&[PRINTER]);
        let printer = connection(&transport);
        let formatter = ReceiptFormatter::new(ReceiptLayout::default());
        scan(&printer).await.unwrap();
        connect(&printer, PRINTER).await.unwrap();

        let ledger = LedgerState::seeded(["Coke"]);
        let err = print(&ledger, &printer, &formatter, now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NothingToPrint);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_scan_shows_tips() {
        let transport = MockTransport::new(Vec::new());
        let printer = connection(&transport);

        let out = scan(&printer).await.unwrap();
        assert!(out.starts_with("No printers found."));
        assert!(out.contains("Troubleshooting tips"));
    }

    #[tokio::test]
    async fn test_connect_unknown_row_or_id() {
        let transport = MockTransport::with_device_ids(&[PRINTER]);
        let printer = connection(&transport);
        scan(&printer).await.unwrap();

        let err = connect(&printer, "5").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = connect(&printer, "AA:AA:AA:AA:AA:AA").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConnectFailed);
        assert_eq!(transport.calls(MockOp::Connect), 0);
    }

    #[tokio::test]
    async fn test_scan_failure_maps_to_scan_failed() {
        let transport = MockTransport::with_device_ids(&[PRINTER]);
        transport.fail(MockOp::Initialize, TransportError::NotReady("bluetooth off".into()));
        let printer = connection(&transport);

        let err = scan(&printer).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ScanFailed);
        assert!(err.message.contains("bluetooth off"));
    }

    #[tokio::test]
    async fn test_disconnect_and_status() {
        let transport = MockTransport::with_device_ids(&[PRINTER]);
        let printer = connection(&transport);

        assert_eq!(disconnect(&printer).await.unwrap(), "No printer was connected.");

        scan(&printer).await.unwrap();
        connect(&printer, "1").await.unwrap();
        assert!(status(&printer).await.contains("Ready to print: yes"));

        assert_eq!(
            disconnect(&printer).await.unwrap(),
            format!("Disconnected from {}", PRINTER)
        );
        assert_eq!(printer.manager().state().await, PrinterState::Disconnected);

        let out = status(&printer).await;
        assert!(out.starts_with("Printer: disconnected"));
        assert!(out.contains("Known devices: 1"));
        assert!(out.contains("Ready to print: no"));
    }
}
