//! # Ledger
//!
//! The line item store and the calculation engine on top of it.
//!
//! ## Ledger Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger Operations                                  │
//! │                                                                         │
//! │  Operator Action          Ledger Call              Effect              │
//! │  ───────────────          ───────────              ──────              │
//! │                                                                         │
//! │  "add"  ─────────────────► add_item() ───────────► items.push(blank)   │
//! │                                                                         │
//! │  "price 2 40" ───────────► update_item(UnitPrice) ► price, line_total  │
//! │                                                                         │
//! │  "qty 2 3" ──────────────► update_item(Quantity) ─► qty, line_total    │
//! │                                                                         │
//! │  "remove 2" ─────────────► remove_item() ─────────► items.retain(..)   │
//! │                                                                         │
//! │  "clear" ────────────────► clear_all() ───────────► zero every row     │
//! │                                                                         │
//! │  "total" ────────────────► grand_total() ─────────► Σ line_total       │
//! │                                                                         │
//! │  NOTE: grand_total() is summed afresh on every call. Nothing keeps a   │
//! │        running total that could go stale.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `unit_price >= 0` and `quantity >= 0` for every stored item
//! - `line_total == unit_price * quantity` after every mutation
//! - Ids are unique and never reused, even after removal
//! - Unknown ids are a no-op for every mutation, never an error

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Item Identity
// =============================================================================

/// Opaque identifier of a line item.
///
/// Assigned by the ledger when the item is created. A UUID v4 is used so an
/// id that was removed can never collide with a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    fn new() -> Self {
        ItemId(Uuid::new_v4())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Calculation Engine
// =============================================================================

/// Computes a line total: `unit_price × quantity`.
///
/// Negative inputs are clamped to zero first. Integer centavos all the way,
/// so the result is exact.
///
/// ```rust
/// use tally_core::ledger::line_total;
/// use tally_core::Money;
///
/// assert_eq!(line_total(Money::from_cents(4500), 3).cents(), 13500);
/// assert_eq!(line_total(Money::from_cents(4500), -3).cents(), 0);
/// ```
pub fn line_total(unit_price: Money, quantity: i64) -> Money {
    unit_price
        .clamp_non_negative()
        .multiply_quantity(quantity.max(0))
}

// =============================================================================
// Line Item
// =============================================================================

/// One row of the ledger: a product name, a case price and a case count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    id: ItemId,

    /// Free-form display name. May be empty.
    pub name: String,

    unit_price: Money,
    quantity: i64,

    // Kept in sync by `reprice`; never written from outside this module.
    line_total: Money,
}

impl LineItem {
    fn blank(name: String) -> Self {
        LineItem {
            id: ItemId::new(),
            name,
            unit_price: Money::zero(),
            quantity: 0,
            line_total: Money::zero(),
        }
    }

    /// The item's id.
    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Price of one case. Never negative.
    #[inline]
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// Number of cases. Never negative.
    #[inline]
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// `unit_price × quantity`, as of the last mutation.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    fn reprice(&mut self) {
        self.line_total = line_total(self.unit_price, self.quantity);
    }
}

/// A single-field change to a line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    /// Replace the display name.
    Name(String),
    /// Replace the case price. Negatives are stored as zero.
    UnitPrice(Money),
    /// Replace the case count. Negatives are stored as zero.
    Quantity(i64),
}

// =============================================================================
// Ledger
// =============================================================================

/// The ordered list of line items for one order.
///
/// The ledger lives only as long as the session; it is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    items: Vec<LineItem>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Ledger { items: Vec::new() }
    }

    /// Creates a ledger pre-seeded with blank rows carrying the given names.
    ///
    /// ```rust
    /// use tally_core::Ledger;
    ///
    /// let ledger = Ledger::with_names(["Coke", "Sprite", "Pepsi"]);
    /// assert_eq!(ledger.len(), 3);
    /// assert!(ledger.grand_total().is_zero());
    /// ```
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ledger {
            items: names
                .into_iter()
                .map(|name| LineItem::blank(name.into()))
                .collect(),
        }
    }

    /// Appends a blank item (empty name, zero price, zero quantity).
    pub fn add_item(&mut self) -> ItemId {
        self.add_named_item(String::new())
    }

    /// Appends a blank item with a name already filled in.
    pub fn add_named_item(&mut self, name: impl Into<String>) -> ItemId {
        let item = LineItem::blank(name.into());
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Removes the item with the given id.
    ///
    /// Returns `false` (and changes nothing) if no such item exists. The
    /// ledger itself has no minimum row count; it may become empty.
    pub fn remove_item(&mut self, id: &ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != *id);
        self.items.len() != before
    }

    /// Applies a single-field update and recomputes the line total.
    ///
    /// Returns `false` (and changes nothing) if no such item exists.
    ///
    /// ```rust
    /// use tally_core::{ItemUpdate, Ledger, Money};
    ///
    /// let mut ledger = Ledger::new();
    /// let id = ledger.add_item();
    /// ledger.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(4500)));
    /// ledger.update_item(&id, ItemUpdate::Quantity(3));
    /// assert_eq!(ledger.grand_total().cents(), 13500);
    /// ```
    pub fn update_item(&mut self, id: &ItemId, update: ItemUpdate) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == *id) else {
            return false;
        };

        match update {
            ItemUpdate::Name(name) => item.name = name,
            ItemUpdate::UnitPrice(price) => item.unit_price = price.clamp_non_negative(),
            ItemUpdate::Quantity(quantity) => item.quantity = quantity.max(0),
        }
        item.reprice();
        true
    }

    /// Zeroes every price, quantity and line total.
    ///
    /// Names, ids and the number of rows are kept, so the operator can start
    /// a new order on the same product list.
    pub fn clear_all(&mut self) {
        for item in &mut self.items {
            item.unit_price = Money::zero();
            item.quantity = 0;
            item.reprice();
        }
    }

    /// Sum of all current line totals, computed afresh.
    pub fn grand_total(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Looks up an item by id.
    pub fn item(&self, id: &ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the ledger has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of cases across all rows.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Whether there is anything worth printing.
    pub fn has_nonzero_total(&self) -> bool {
        self.grand_total().is_positive()
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Totals summary for display and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub grand_total_cents: i64,
}

impl From<&Ledger> for LedgerTotals {
    fn from(ledger: &Ledger) -> Self {
        LedgerTotals {
            item_count: ledger.len(),
            total_quantity: ledger.total_quantity(),
            grand_total_cents: ledger.grand_total().cents(),
        }
    }
}

/// A point-in-time copy of the ledger, read back after each mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub items: Vec<LineItem>,
    pub totals: LedgerTotals,
}

impl From<&Ledger> for LedgerSnapshot {
    fn from(ledger: &Ledger) -> Self {
        LedgerSnapshot {
            items: ledger.items.clone(),
            totals: LedgerTotals::from(ledger),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(ledger: &mut Ledger, name: &str, cents: i64, qty: i64) -> ItemId {
        let id = ledger.add_named_item(name);
        ledger.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(cents)));
        ledger.update_item(&id, ItemUpdate::Quantity(qty));
        id
    }

    fn fresh_sum(ledger: &Ledger) -> i64 {
        ledger
            .items()
            .iter()
            .map(|i| i.unit_price().cents() * i.quantity())
            .sum()
    }

    #[test]
    fn test_add_item_is_blank() {
        let mut ledger = Ledger::new();
        let id = ledger.add_item();
        let item = ledger.item(&id).unwrap();

        assert_eq!(item.name, "");
        assert_eq!(item.unit_price(), Money::zero());
        assert_eq!(item.quantity(), 0);
        assert_eq!(item.line_total(), Money::zero());
    }

    #[test]
    fn test_ids_are_unique_after_removal() {
        let mut ledger = Ledger::new();
        let first = ledger.add_item();
        assert!(ledger.remove_item(&first));
        let second = ledger.add_item();
        assert_ne!(first, second);
    }

    #[test]
    fn test_coke_and_sprite_totals() {
        let mut ledger = Ledger::new();
        let coke = priced(&mut ledger, "Coke", 4500, 3);
        let sprite = priced(&mut ledger, "Sprite", 4000, 2);

        assert_eq!(ledger.item(&coke).unwrap().line_total().cents(), 13500);
        assert_eq!(ledger.item(&sprite).unwrap().line_total().cents(), 8000);
        assert_eq!(ledger.grand_total().cents(), 21500);
        assert!(ledger.has_nonzero_total());
    }

    #[test]
    fn test_negative_inputs_are_clamped() {
        let mut ledger = Ledger::new();
        let id = priced(&mut ledger, "Pepsi", -100, 5);
        assert_eq!(ledger.item(&id).unwrap().unit_price(), Money::zero());

        ledger.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(1000)));
        ledger.update_item(&id, ItemUpdate::Quantity(-4));
        let item = ledger.item(&id).unwrap();
        assert_eq!(item.quantity(), 0);
        assert_eq!(item.line_total(), Money::zero());
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut ledger = Ledger::new();
        priced(&mut ledger, "Coke", 4500, 3);
        let stranger = Ledger::new().add_item();

        assert!(!ledger.remove_item(&stranger));
        assert!(!ledger.update_item(&stranger, ItemUpdate::Quantity(10)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.grand_total().cents(), 13500);
    }

    #[test]
    fn test_clear_all_keeps_names_and_ids() {
        let mut ledger = Ledger::new();
        let coke = priced(&mut ledger, "Coke", 4500, 3);
        priced(&mut ledger, "Sprite", 4000, 2);

        ledger.clear_all();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.items()[0].name, "Coke");
        assert_eq!(ledger.items()[0].id(), coke);
        assert!(ledger.grand_total().is_zero());
        assert!(ledger.items().iter().all(|i| i.quantity() == 0));
        assert!(!ledger.has_nonzero_total());
    }

    #[test]
    fn test_rename_keeps_total() {
        let mut ledger = Ledger::new();
        let id = priced(&mut ledger, "Coke", 4500, 3);
        assert!(ledger.update_item(&id, ItemUpdate::Name("Coke Zero".to_string())));
        assert_eq!(ledger.item(&id).unwrap().name, "Coke Zero");
        assert_eq!(ledger.grand_total().cents(), 13500);
    }

    #[test]
    fn test_remove_may_empty_the_ledger() {
        let mut ledger = Ledger::with_names(["Only"]);
        let id = ledger.items()[0].id();
        assert!(ledger.remove_item(&id));
        assert!(ledger.is_empty());
        assert!(ledger.grand_total().is_zero());
    }

    /// A scripted mix of every mutation; the grand total must match a
    /// from-scratch sum after each step.
    #[test]
    fn test_grand_total_matches_fresh_sum_after_every_step() {
        let mut ledger = Ledger::with_names(["Coke", "Sprite", "Pepsi"]);
        let ids: Vec<ItemId> = ledger.items().iter().map(LineItem::id).collect();

        let steps: Vec<Box<dyn Fn(&mut Ledger) + '_>> = vec![
            Box::new(|l| {
                l.update_item(&ids[0], ItemUpdate::UnitPrice(Money::from_cents(4500)));
            }),
            Box::new(|l| {
                l.update_item(&ids[0], ItemUpdate::Quantity(3));
            }),
            Box::new(|l| {
                l.update_item(&ids[1], ItemUpdate::UnitPrice(Money::from_cents(4000)));
            }),
            Box::new(|l| {
                l.update_item(&ids[1], ItemUpdate::Quantity(2));
            }),
            Box::new(|l| {
                l.update_item(&ids[2], ItemUpdate::Quantity(7));
            }),
            Box::new(|l| {
                l.update_item(&ids[2], ItemUpdate::UnitPrice(Money::from_cents(3575)));
            }),
            Box::new(|l| {
                l.remove_item(&ids[1]);
            }),
            Box::new(|l| {
                let id = l.add_item();
                l.update_item(&id, ItemUpdate::UnitPrice(Money::from_cents(1)));
                l.update_item(&id, ItemUpdate::Quantity(999));
            }),
            Box::new(|l| {
                l.update_item(&ids[0], ItemUpdate::Quantity(-1));
            }),
            Box::new(|l| l.clear_all()),
        ];

        for step in &steps {
            step(&mut ledger);
            assert_eq!(ledger.grand_total().cents(), fresh_sum(&ledger));
        }
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let mut ledger = Ledger::new();
        priced(&mut ledger, "Coke", 4500, 3);

        let json = serde_json::to_value(LedgerSnapshot::from(&ledger)).unwrap();
        assert_eq!(json["items"][0]["name"], "Coke");
        assert_eq!(json["items"][0]["unitPrice"], 4500);
        assert_eq!(json["items"][0]["lineTotal"], 13500);
        assert_eq!(json["totals"]["grandTotalCents"], 13500);
        assert_eq!(json["totals"]["totalQuantity"], 3);
    }
}
