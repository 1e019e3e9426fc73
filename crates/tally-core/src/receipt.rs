//! # Receipt Formatter
//!
//! Renders a ledger as fixed-width text for a thermal printer.
//!
//! ## Receipt Anatomy (defaults, 58mm paper = 32 columns)
//! ```text
//! ┌────────────────────────────────┐
//! │    JOY LOVE CONSUMER GOODS     │  store lines (centered)
//! │         Beverage List          │  title (centered)
//! │Date: 2026-10-18                │
//! │Time: 14:05:09                  │
//! │--------------------------------│
//! │Item       Qty    Price    Total│  column header
//! │--------------------------------│
//! │Coke         3    45.00   135.00│  one row per line item
//! │Sprite       2    40.00    80.00│
//! │--------------------------------│
//! │GRAND TOTAL           PHP 215.00│
//! │--------------------------------│
//! │           Thank you!           │  footer (centered)
//! │                                │  feed lines
//! └────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Names are truncated by *characters* (never mid-codepoint) and padded.
//! - A numeric cell that fills its column gets one leading space; a cell
//!   wider than its column widens the row. Amounts are never clipped.
//! - No clock, no locale, no mutable state: the same ledger, timestamp and
//!   layout always produce byte-identical text.
//! - Control characters in names are passed through as-is. Names are
//!   cleaned on the way *in* (see [`crate::validation::sanitize_display_name`]).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::ledger::{Ledger, LineItem};
use crate::money::{CurrencyFormat, Money};

// =============================================================================
// Layout
// =============================================================================

/// Everything that controls how a receipt looks.
///
/// Loaded from the `[receipt]` section of the config file; every field has
/// a default so a partial section is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLayout {
    /// Paper width in characters.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Width of the item name column.
    #[serde(default = "default_name_width")]
    pub name_width: usize,

    /// Width of the quantity column.
    #[serde(default = "default_quantity_width")]
    pub quantity_width: usize,

    /// Width of the unit price column.
    #[serde(default = "default_amount_width")]
    pub price_width: usize,

    /// Width of the line total column.
    #[serde(default = "default_amount_width")]
    pub total_width: usize,

    /// Centered lines printed above the title (store name, address...).
    #[serde(default = "default_store_lines")]
    pub store_lines: Vec<String>,

    /// Centered title line.
    #[serde(default = "default_title")]
    pub title: String,

    /// Character used for separator rules.
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Label on the left of the grand-total line.
    #[serde(default = "default_total_label")]
    pub total_label: String,

    /// Centered lines printed after the grand total.
    #[serde(default = "default_footer_lines")]
    pub footer_lines: Vec<String>,

    /// Blank lines appended so the tear bar clears the last printed line.
    #[serde(default = "default_feed_lines")]
    pub feed_lines: usize,

    /// Amount formatting.
    #[serde(default)]
    pub currency: CurrencyFormat,
}

fn default_width() -> usize {
    32
}

fn default_name_width() -> usize {
    10
}

fn default_quantity_width() -> usize {
    4
}

/// Fits `9,999.99` plus the space that separates it from the cell on its left.
fn default_amount_width() -> usize {
    9
}

fn default_store_lines() -> Vec<String> {
    vec!["JOY LOVE CONSUMER GOODS".to_string()]
}

fn default_title() -> String {
    "Beverage List".to_string()
}

fn default_separator() -> char {
    '-'
}

fn default_total_label() -> String {
    "GRAND TOTAL".to_string()
}

fn default_footer_lines() -> Vec<String> {
    vec!["Thank you!".to_string()]
}

fn default_feed_lines() -> usize {
    3
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        ReceiptLayout {
            width: default_width(),
            name_width: default_name_width(),
            quantity_width: default_quantity_width(),
            price_width: default_amount_width(),
            total_width: default_amount_width(),
            store_lines: default_store_lines(),
            title: default_title(),
            separator: default_separator(),
            total_label: default_total_label(),
            footer_lines: default_footer_lines(),
            feed_lines: default_feed_lines(),
            currency: CurrencyFormat::default(),
        }
    }
}

impl ReceiptLayout {
    /// Sum of the four column widths.
    pub fn columns_width(&self) -> usize {
        self.name_width + self.quantity_width + self.price_width + self.total_width
    }

    /// Checks that the columns fit on the paper.
    ///
    /// The formatter itself copes with any layout; this only guards config
    /// files against typos like `width = 3`.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.width < 16 {
            return Err(ValidationError::InvalidFormat {
                field: "receipt.width".to_string(),
                reason: format!("{} columns is narrower than any thermal paper", self.width),
            });
        }
        if self.name_width == 0 || self.quantity_width == 0 {
            return Err(ValidationError::InvalidFormat {
                field: "receipt.columns".to_string(),
                reason: "name and quantity columns must be at least 1 wide".to_string(),
            });
        }
        if self.columns_width() > self.width {
            return Err(ValidationError::InvalidFormat {
                field: "receipt.columns".to_string(),
                reason: format!(
                    "columns need {} characters but the paper is {} wide",
                    self.columns_width(),
                    self.width
                ),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Formatter
// =============================================================================

/// Stateless receipt renderer bound to one layout.
///
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::{ItemUpdate, Ledger, Money, ReceiptFormatter, ReceiptLayout};
///
/// let mut ledger = Ledger::new();
/// let coke = ledger.add_named_item("Coke");
/// ledger.update_item(&coke, ItemUpdate::UnitPrice(Money::from_cents(4500)));
/// ledger.update_item(&coke, ItemUpdate::Quantity(3));
///
/// let at = NaiveDate::from_ymd_opt(2026, 10, 18)
///     .unwrap()
///     .and_hms_opt(14, 5, 9)
///     .unwrap();
/// let text = ReceiptFormatter::new(ReceiptLayout::default()).format(&ledger, at);
/// assert!(text.contains("PHP 135.00"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReceiptFormatter {
    layout: ReceiptLayout,
}

impl ReceiptFormatter {
    pub fn new(layout: ReceiptLayout) -> Self {
        ReceiptFormatter { layout }
    }

    pub fn layout(&self) -> &ReceiptLayout {
        &self.layout
    }

    /// Renders the ledger. Every line ends with `\n`.
    pub fn format(&self, ledger: &Ledger, timestamp: NaiveDateTime) -> String {
        let layout = &self.layout;
        let mut lines: Vec<String> = Vec::with_capacity(ledger.len() + 16);

        // Header
        for line in &layout.store_lines {
            lines.push(self.centered(line));
        }
        if !layout.title.is_empty() {
            lines.push(self.centered(&layout.title));
        }
        lines.push(format!("Date: {}", timestamp.format("%Y-%m-%d")));
        lines.push(format!("Time: {}", timestamp.format("%H:%M:%S")));

        // Body
        lines.push(self.rule());
        lines.push(self.row_cells("Item", "Qty", "Price", "Total"));
        lines.push(self.rule());
        for item in ledger.items() {
            lines.push(self.item_row(item));
        }
        lines.push(self.rule());

        // Total
        lines.push(self.total_line(ledger.grand_total()));
        lines.push(self.rule());

        // Footer
        for line in &layout.footer_lines {
            lines.push(self.centered(line));
        }
        lines.extend(std::iter::repeat(String::new()).take(layout.feed_lines));

        let mut out = String::with_capacity(lines.len() * (layout.width + 1));
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn item_row(&self, item: &LineItem) -> String {
        let currency = &self.layout.currency;
        self.row_cells(
            &item.name,
            &item.quantity().to_string(),
            &item.unit_price().format_amount(currency),
            &item.line_total().format_amount(currency),
        )
    }

    fn row_cells(&self, name: &str, quantity: &str, price: &str, total: &str) -> String {
        let layout = &self.layout;
        let mut row = pad_right(&truncate_chars(name, layout.name_width), layout.name_width);
        row.push_str(&right_cell(quantity, layout.quantity_width));
        row.push_str(&right_cell(price, layout.price_width));
        row.push_str(&right_cell(total, layout.total_width));
        row
    }

    fn total_line(&self, total: Money) -> String {
        let label = &self.layout.total_label;
        let amount = total.format_with_symbol(&self.layout.currency);
        let used = char_len(label) + char_len(&amount);
        let gap = self.layout.width.saturating_sub(used).max(1);
        format!("{}{}{}", label, " ".repeat(gap), amount)
    }

    fn rule(&self) -> String {
        std::iter::repeat(self.layout.separator)
            .take(self.layout.width)
            .collect()
    }

    /// Left padding only; trailing spaces would just waste print time.
    fn centered(&self, text: &str) -> String {
        let pad = self.layout.width.saturating_sub(char_len(text)) / 2;
        format!("{}{}", " ".repeat(pad), text)
    }
}

/// Renders a receipt with a one-off formatter.
pub fn format_receipt(ledger: &Ledger, timestamp: NaiveDateTime, layout: &ReceiptLayout) -> String {
    ReceiptFormatter::new(layout.clone()).format(ledger, timestamp)
}

// =============================================================================
// Column Helpers
// =============================================================================

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn pad_right(s: &str, width: usize) -> String {
    let len = char_len(s);
    let mut out = String::from(s);
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

fn right_cell(s: &str, width: usize) -> String {
    let len = char_len(s);
    if len >= width {
        format!(" {}", s)
    } else {
        format!("{}{}", " ".repeat(width - len), s)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ItemUpdate;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    fn add(ledger: &mut Ledger, name: &str, cents: i64, qty: i64) {
        let id = ledger.add_named_item(name);
        ledger.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(cents)));
        ledger.update_item(&id, ItemUpdate::Quantity(qty));
    }

    #[test]
    fn test_coke_and_sprite_receipt() {
        let mut ledger = Ledger::new();
        add(&mut ledger, "Coke", 4500, 3);
        add(&mut ledger, "Sprite", 4000, 2);

        let text = ReceiptFormatter::default().format(&ledger, at());

        let expected = concat!(
            "    JOY LOVE CONSUMER GOODS\n",
            "         Beverage List\n",
            "Date: 2026-10-18\n",
            "Time: 14:05:09\n",
            "--------------------------------\n",
            "Item       Qty    Price    Total\n",
            "--------------------------------\n",
            "Coke         3    45.00   135.00\n",
            "Sprite       2    40.00    80.00\n",
            "--------------------------------\n",
            "GRAND TOTAL           PHP 215.00\n",
            "--------------------------------\n",
            "           Thank you!\n",
            "\n",
            "\n",
            "\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_ledger_still_has_header_and_zero_total() {
        let text = ReceiptFormatter::default().format(&Ledger::new(), at());

        assert!(text.contains("Beverage List"));
        assert!(text.contains("Item       Qty    Price    Total"));
        assert!(text.contains("GRAND TOTAL             PHP 0.00\n"));
        assert!(text.contains("Thank you!"));
    }

    #[test]
    fn test_format_is_deterministic() {
        let mut ledger = Ledger::with_names(["Coke", "Sprite", "Pepsi"]);
        let id = ledger.items()[2].id();
        ledger.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(3575)));
        ledger.update_item(&id, ItemUpdate::Quantity(4));

        let formatter = ReceiptFormatter::default();
        assert_eq!(formatter.format(&ledger, at()), formatter.format(&ledger, at()));
    }

    #[test]
    fn test_rows_fit_default_width() {
        let mut ledger = Ledger::new();
        add(&mut ledger, "Coke", 4500, 3);
        add(&mut ledger, "", 0, 0);
        add(&mut ledger, "Coke Case", 4500, 30);
        add(&mut ledger, "Imported", 999_999, 1);

        let text = ReceiptFormatter::default().format(&ledger, at());
        for line in text.lines() {
            assert!(line.chars().count() <= 32, "line too wide: {:?}", line);
        }
        assert!(text.contains("             0     0.00     0.00\n"));
        assert!(text.contains("Coke Case   30    45.00 1,350.00\n"));
        assert!(text.contains("Imported     1 9,999.99 9,999.99\n"));
    }

    #[test]
    fn test_long_name_truncated_by_chars() {
        let mut ledger = Ledger::new();
        add(&mut ledger, "Mañanita Calamansi Juice", 2500, 1);

        let text = ReceiptFormatter::default().format(&ledger, at());
        assert!(text.contains("Mañanita C   1    25.00    25.00\n"));
    }

    #[test]
    fn test_wide_amounts_widen_row_instead_of_clipping() {
        let mut ledger = Ledger::new();
        add(&mut ledger, "Bulk", 123_456_789, 1000);

        let text = ReceiptFormatter::default().format(&ledger, at());
        assert!(text.contains("Bulk       1000 1,234,567.89 1,234,567,890.00\n"));
        assert!(text.contains("GRAND TOTAL PHP 1,234,567,890.00\n"));
    }

    #[test]
    fn test_custom_layout() {
        let layout = ReceiptLayout {
            store_lines: vec![],
            title: String::new(),
            separator: '=',
            footer_lines: vec![],
            feed_lines: 0,
            currency: CurrencyFormat {
                symbol: "₱".to_string(),
                ..CurrencyFormat::default()
            },
            ..ReceiptLayout::default()
        };
        let mut ledger = Ledger::new();
        add(&mut ledger, "Coke", 4500, 3);

        let text = format_receipt(&ledger, at(), &layout);
        assert!(text.starts_with("Date: 2026-10-18\n"));
        assert!(text.contains("================================\n"));
        assert!(text.ends_with("GRAND TOTAL             ₱ 135.00\n================================\n"));
    }

    #[test]
    fn test_layout_validate() {
        assert!(ReceiptLayout::default().validate().is_ok());

        let narrow = ReceiptLayout {
            width: 8,
            ..ReceiptLayout::default()
        };
        assert!(narrow.validate().is_err());

        let crowded = ReceiptLayout {
            name_width: 20,
            ..ReceiptLayout::default()
        };
        assert!(crowded.validate().is_err());
    }

    #[test]
    fn test_layout_partial_config_uses_defaults() {
        let layout: ReceiptLayout = serde_json::from_str(r#"{"width": 48, "name_width": 28}"#).unwrap();
        assert_eq!(layout.width, 48);
        assert_eq!(layout.name_width, 28);
        assert_eq!(layout.title, "Beverage List");
        assert_eq!(layout.currency.symbol, "PHP");
    }
}
