//! # Ledger Commands
//!
//! Commands that edit or display the order.
//!
//! ## Ledger Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger Lifecycle                                     │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Seeded  │────►│  Filled  │────►│ Preview  │────►│ Printed  │       │
//! │  │  rows    │     │  in      │     │          │     │          │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                 │              │
//! │                   price / qty                            │              │
//! │                   add / remove                           │              │
//! │                   name                                   │              │
//! │                        ▲                                 │              │
//! │                        └──────────── clear ◄─────────────┘              │
//! │                              (names kept, amounts zeroed)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Typed Numbers
//! Prices and case counts are forgiving, like a calculator: text that is not
//! a number counts as zero (with a note), and negative numbers are clamped
//! to zero by the ledger (also with a note). A fractional case count keeps
//! its whole part. Row numbers are strict.

use chrono::NaiveDateTime;
use tally_core::validation::{parse_price, parse_quantity, sanitize_display_name};
use tally_core::{CurrencyFormat, ItemUpdate, LedgerSnapshot, Money, ReceiptFormatter};
use tracing::debug;

use crate::error::ApiError;
use crate::state::LedgerState;

// =============================================================================
// Display
// =============================================================================

/// Renders the ledger as a numbered table with the grand total underneath.
///
/// ```text
///   #  Item           Cases      Price      Total
///   1  Coke               3      45.00     135.00
///   2  Sprite             2      40.00      80.00
///
///      Grand total: PHP 215.00
/// ```
pub fn list(ledger: &LedgerState, currency: &CurrencyFormat) -> String {
    ledger.with_ledger(|ledger| {
        let mut out = table_row("#", "Item", "Cases", "Price", "Total");
        out.push('\n');
        for (index, item) in ledger.items().iter().enumerate() {
            out.push_str(&table_row(
                &(index + 1).to_string(),
                &item.name,
                &item.quantity().to_string(),
                &item.unit_price().format_amount(currency),
                &item.line_total().format_amount(currency),
            ));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&format!(
            "     Grand total: {}",
            ledger.grand_total().format_with_symbol(currency)
        ));
        out
    })
}

fn table_row(row: &str, name: &str, cases: &str, price: &str, total: &str) -> String {
    let name: String = name.chars().take(14).collect();
    format!("{:>3}  {:<14}{:>6}{:>11}{:>11}", row, name, cases, price, total)
}

/// Just the grand-total line.
pub fn total(ledger: &LedgerState, currency: &CurrencyFormat) -> String {
    let total = ledger.with_ledger(|l| l.grand_total());
    format!("Grand total: {}", total.format_with_symbol(currency))
}

/// The receipt exactly as it would be printed.
pub fn preview(ledger: &LedgerState, formatter: &ReceiptFormatter, now: NaiveDateTime) -> String {
    ledger.with_ledger(|l| formatter.format(l, now))
}

/// The ledger as pretty JSON (items plus totals).
pub fn snapshot_json(ledger: &LedgerState) -> Result<String, ApiError> {
    let snapshot = ledger.with_ledger(|l| LedgerSnapshot::from(l));
    serde_json::to_string_pretty(&snapshot).map_err(|e| ApiError::internal(e.to_string()))
}

// =============================================================================
// Row Management
// =============================================================================

/// Appends a row. Without a name it is called `Item N`.
pub fn add(ledger: &LedgerState, currency: &CurrencyFormat, name: Option<&str>) -> String {
    ledger.with_ledger_mut(|l| {
        let name = match name.map(sanitize_display_name) {
            Some(name) if !name.is_empty() => name,
            _ => format!("Item {}", l.len() + 1),
        };
        debug!(name = %name, "Adding ledger row");
        l.add_named_item(name);
    });
    list(ledger, currency)
}

/// Removes a row. The last remaining row cannot be removed.
pub fn remove(ledger: &LedgerState, currency: &CurrencyFormat, row: &str) -> Result<String, ApiError> {
    let id = ledger.id_at_row(row)?;
    ledger.with_ledger_mut(|l| {
        if l.len() <= 1 {
            return Err(ApiError::ledger(
                "The last row cannot be removed. Use `clear` to zero it instead.",
            ));
        }
        if !l.remove_item(&id) {
            return Err(ApiError::ledger(format!("Row {} no longer exists", row.trim())));
        }
        Ok(())
    })?;
    Ok(list(ledger, currency))
}

/// Zeroes every price and quantity; names stay.
pub fn clear(ledger: &LedgerState, currency: &CurrencyFormat) -> String {
    ledger.with_ledger_mut(|l| l.clear_all());
    list(ledger, currency)
}

// =============================================================================
// Field Updates
// =============================================================================

/// Renames a row. Control characters are replaced and the name is trimmed.
pub fn rename(
    ledger: &LedgerState,
    currency: &CurrencyFormat,
    row: &str,
    text: &str,
) -> Result<String, ApiError> {
    apply(ledger, row, ItemUpdate::Name(sanitize_display_name(text)))?;
    Ok(list(ledger, currency))
}

/// Sets a row's case price.
pub fn set_price(
    ledger: &LedgerState,
    currency: &CurrencyFormat,
    row: &str,
    text: &str,
) -> Result<String, ApiError> {
    let mut notes = Vec::new();
    let price = match parse_price(text) {
        Ok(price) => price,
        Err(e) => {
            notes.push(format!("note: {}; price set to 0.00", e));
            Money::zero()
        }
    };
    if price.is_negative() {
        notes.push("note: negative price clamped to 0.00".to_string());
    }

    apply(ledger, row, ItemUpdate::UnitPrice(price))?;
    Ok(with_notes(notes, list(ledger, currency)))
}

/// Sets a row's case count.
pub fn set_quantity(
    ledger: &LedgerState,
    currency: &CurrencyFormat,
    row: &str,
    text: &str,
) -> Result<String, ApiError> {
    let mut notes = Vec::new();
    let quantity = match parse_quantity(text) {
        Ok(quantity) => {
            if text.contains('.') {
                notes.push(format!(
                    "note: cases are whole numbers; '{}' counted as {}",
                    text.trim(),
                    quantity
                ));
            }
            quantity
        }
        Err(e) => {
            notes.push(format!("note: {}; cases set to 0", e));
            0
        }
    };
    if quantity < 0 {
        notes.push("note: negative cases clamped to 0".to_string());
    }

    apply(ledger, row, ItemUpdate::Quantity(quantity))?;
    Ok(with_notes(notes, list(ledger, currency)))
}

fn apply(ledger: &LedgerState, row: &str, update: ItemUpdate) -> Result<(), ApiError> {
    let id = ledger.id_at_row(row)?;
    if ledger.with_ledger_mut(|l| l.update_item(&id, update)) {
        Ok(())
    } else {
        Err(ApiError::ledger(format!("Row {} no longer exists", row.trim())))
    }
}

fn with_notes(notes: Vec<String>, body: String) -> String {
    if notes.is_empty() {
        return body;
    }
    format!("{}\n{}", notes.join("\n"), body)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;
    use tally_core::ReceiptLayout;

    fn seeded() -> LedgerState {
        LedgerState::seeded(["Coke", "Sprite", "Pepsi"])
    }

    fn currency() -> CurrencyFormat {
        CurrencyFormat::default()
    }

    fn grand_total(ledger: &LedgerState) -> i64 {
        ledger.with_ledger(|l| l.grand_total().cents())
    }

    #[test]
    fn test_list_rows_are_numbered_from_one() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "1", "45").unwrap();
        let out = set_quantity(&ledger, &currency(), "1", "3").unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "  #  Item           Cases      Price      Total");
        assert_eq!(lines[1], "  1  Coke               3      45.00     135.00");
        assert_eq!(lines[2], "  2  Sprite             0       0.00       0.00");
        assert_eq!(lines.last().copied(), Some("     Grand total: PHP 135.00"));
    }

    #[test]
    fn test_coke_and_sprite_total() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "1", "45").unwrap();
        set_quantity(&ledger, &currency(), "1", "3").unwrap();
        set_price(&ledger, &currency(), "2", "40.00").unwrap();
        set_quantity(&ledger, &currency(), "2", "2").unwrap();

        assert_eq!(total(&ledger, &currency()), "Grand total: PHP 215.00");
    }

    #[test]
    fn test_unparseable_price_counts_as_zero() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "1", "45").unwrap();
        set_quantity(&ledger, &currency(), "1", "3").unwrap();

        let out = set_price(&ledger, &currency(), "1", "forty-five").unwrap();
        assert!(out.starts_with("note: price has invalid format"));
        assert_eq!(grand_total(&ledger), 0);
    }

    #[test]
    fn test_negative_quantity_is_clamped() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "1", "45").unwrap();

        let out = set_quantity(&ledger, &currency(), "1", "-4").unwrap();
        assert!(out.starts_with("note: negative cases clamped to 0"));
        assert_eq!(ledger.with_ledger(|l| l.items()[0].quantity()), 0);
    }

    #[test]
    fn test_fractional_cases_keep_whole_part() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "1", "45").unwrap();

        let out = set_quantity(&ledger, &currency(), "1", "3.5").unwrap();
        assert!(out.starts_with("note: cases are whole numbers; '3.5' counted as 3"));
        assert_eq!(ledger.with_ledger(|l| l.items()[0].quantity()), 3);
        assert_eq!(grand_total(&ledger), 13500);
    }

    #[test]
    fn test_bad_row_is_rejected() {
        let ledger = seeded();
        let err = set_price(&ledger, &currency(), "9", "45").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("row 9"));
    }

    #[test]
    fn test_add_defaults_to_item_n() {
        let ledger = seeded();
        add(&ledger, &currency(), None);
        add(&ledger, &currency(), Some("  Royal\t1L "));

        let names: Vec<String> = ledger.with_ledger(|l| l.items().iter().map(|i| i.name.clone()).collect());
        assert_eq!(names, vec!["Coke", "Sprite", "Pepsi", "Item 4", "Royal 1L"]);
    }

    #[test]
    fn test_remove_refuses_last_row() {
        let ledger = LedgerState::seeded(["Coke", "Sprite"]);
        remove(&ledger, &currency(), "1").unwrap();
        assert_eq!(ledger.with_ledger(|l| l.items()[0].name.clone()), "Sprite");

        let err = remove(&ledger, &currency(), "1").unwrap_err();
        assert_eq!(err.code, ErrorCode::LedgerError);
        assert_eq!(ledger.with_ledger(|l| l.len()), 1);
    }

    #[test]
    fn test_clear_keeps_names() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "2", "40").unwrap();
        set_quantity(&ledger, &currency(), "2", "2").unwrap();
        rename(&ledger, &currency(), "2", "Sprite Zero").unwrap();

        clear(&ledger, &currency());
        assert_eq!(grand_total(&ledger), 0);
        assert_eq!(ledger.with_ledger(|l| l.items()[1].name.clone()), "Sprite Zero");
        assert_eq!(ledger.with_ledger(|l| l.len()), 3);
    }

    #[test]
    fn test_preview_matches_formatter() {
        let ledger = seeded();
        let formatter = ReceiptFormatter::new(ReceiptLayout::default());
        let now = NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        let out = preview(&ledger, &formatter, now);
        assert_eq!(out, ledger.with_ledger(|l| formatter.format(l, now)));
        assert!(out.contains("Beverage List"));
    }

    #[test]
    fn test_snapshot_json() {
        let ledger = seeded();
        set_price(&ledger, &currency(), "1", "45").unwrap();
        set_quantity(&ledger, &currency(), "1", "3").unwrap();

        let json: serde_json::Value = serde_json::from_str(&snapshot_json(&ledger).unwrap()).unwrap();
        assert_eq!(json["items"][0]["name"], "Coke");
        assert_eq!(json["totals"]["grandTotalCents"], 13500);
        assert_eq!(json["totals"]["itemCount"], 3);
    }
}
