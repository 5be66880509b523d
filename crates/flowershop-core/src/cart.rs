//! Session cart bookkeeping.
//!
//! A cart is nothing more than `product id -> quantity`. It is stored as a
//! JSON object keyed by the product id string, e.g. `{"12": 3}`.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CoreError;

/// Per-line quantity ceiling.
pub const MAX_QTY_PER_LINE: u32 = 99;

/// Longest accepted discount code.
pub const MAX_DISCOUNT_CODE_CHARS: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Корзина пуста")]
    Empty,
    #[error("Укажите имя и телефон")]
    MissingContact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: BTreeMap<i64, u32>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a line by one, capped at [`MAX_QTY_PER_LINE`]. Returns the new quantity.
    pub fn add_one(&mut self, product_id: i64) -> u32 {
        let qty = self.lines.entry(product_id).or_insert(0);
        *qty = (*qty + 1).min(MAX_QTY_PER_LINE);
        *qty
    }

    /// Set a line's quantity. Zero or negative removes the line. Returns the
    /// resulting quantity (0 when removed).
    pub fn set_qty(&mut self, product_id: i64, qty: i64) -> u32 {
        if qty <= 0 {
            self.lines.remove(&product_id);
            return 0;
        }
        let capped = u32::try_from(qty)
            .unwrap_or(MAX_QTY_PER_LINE)
            .min(MAX_QTY_PER_LINE);
        self.lines.insert(product_id, capped);
        capped
    }

    /// Drop a line. Returns whether it was present.
    pub fn remove(&mut self, product_id: i64) -> bool {
        self.lines.remove(&product_id).is_some()
    }

    #[must_use]
    pub fn qty(&self, product_id: i64) -> u32 {
        self.lines.get(&product_id).copied().unwrap_or(0)
    }

    /// Sum of all quantities, shown as the header badge.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<i64> {
        self.lines.keys().copied().collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = (i64, u32)> + '_ {
        self.lines.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Contact details captured at checkout together with the cart contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub name: String,
    pub phone: String,
    pub comment: String,
    pub items: Cart,
}

/// Validate checkout input and turn the cart into a placed order, leaving the
/// cart empty.
///
/// # Errors
///
/// [`CartError::MissingContact`] when name or phone is blank after trimming,
/// [`CartError::Empty`] when there is nothing to order.
pub fn checkout(
    cart: &mut Cart,
    name: &str,
    phone: &str,
    comment: &str,
) -> Result<PlacedOrder, CartError> {
    let name = name.trim();
    let phone = phone.trim();
    if name.is_empty() || phone.is_empty() {
        return Err(CartError::MissingContact);
    }
    if cart.is_empty() {
        return Err(CartError::Empty);
    }
    let items = std::mem::take(cart);
    Ok(PlacedOrder {
        name: name.to_string(),
        phone: phone.to_string(),
        comment: comment.trim().to_string(),
        items,
    })
}

// ---------------------------------------------------------------------------
// Discounts
// ---------------------------------------------------------------------------

/// Trim and upper-case a discount code so lookups ignore case.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when the code is blank or longer than
/// [`MAX_DISCOUNT_CODE_CHARS`].
pub fn normalize_discount_code(code: &str) -> Result<String, CoreError> {
    let code = code.trim().to_uppercase();
    if code.is_empty() || code.chars().count() > MAX_DISCOUNT_CODE_CHARS {
        return Err(CoreError::InvalidField {
            field: "code",
            message: "must be 1-20 characters",
        });
    }
    Ok(code)
}

/// # Errors
///
/// Returns [`CoreError::InvalidField`] unless `percent` is within `1..=100`.
pub fn validate_discount_percent(percent: i32) -> Result<i32, CoreError> {
    if (1..=100).contains(&percent) {
        Ok(percent)
    } else {
        Err(CoreError::InvalidField {
            field: "percent",
            message: "must be between 1 and 100",
        })
    }
}

/// Total after taking `percent` off, rounded half-up to kopecks.
#[must_use]
pub fn apply_discount(total: Decimal, percent: i32) -> Decimal {
    let percent = Decimal::from(percent.clamp(0, 100));
    let kept = (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED;
    (total * kept).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_one_increments_and_caps() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_one(7), 1);
        assert_eq!(cart.add_one(7), 2);
        cart.set_qty(7, 99);
        assert_eq!(cart.add_one(7), MAX_QTY_PER_LINE);
        assert_eq!(cart.count(), 99);
    }

    #[test]
    fn set_qty_removes_on_zero_or_negative() {
        let mut cart = Cart::new();
        cart.set_qty(3, 4);
        assert_eq!(cart.set_qty(3, 0), 0);
        assert!(cart.is_empty());

        cart.set_qty(3, 2);
        assert_eq!(cart.set_qty(3, -5), 0);
        assert_eq!(cart.qty(3), 0);
    }

    #[test]
    fn set_qty_caps_large_values() {
        let mut cart = Cart::new();
        assert_eq!(cart.set_qty(1, 500), MAX_QTY_PER_LINE);
        assert_eq!(cart.set_qty(1, i64::MAX), MAX_QTY_PER_LINE);
    }

    #[test]
    fn count_sums_all_lines() {
        let mut cart = Cart::new();
        cart.set_qty(1, 2);
        cart.set_qty(2, 3);
        cart.add_one(5);
        assert_eq!(cart.count(), 6);
        assert_eq!(cart.product_ids(), vec![1, 2, 5]);
    }

    #[test]
    fn remove_reports_presence() {
        let mut cart = Cart::new();
        cart.add_one(9);
        assert!(cart.remove(9));
        assert!(!cart.remove(9));
    }

    #[test]
    fn serializes_as_object_keyed_by_id_string() {
        let mut cart = Cart::new();
        cart.set_qty(12, 3);
        let json = serde_json::to_value(&cart).expect("serialize");
        assert_eq!(json, serde_json::json!({"12": 3}));

        let back: Cart = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.qty(12), 3);
    }

    #[test]
    fn checkout_requires_contact_then_items() {
        let mut cart = Cart::new();
        assert_eq!(
            checkout(&mut cart, " ", "+375291112233", ""),
            Err(CartError::MissingContact)
        );
        assert_eq!(
            checkout(&mut cart, "Ольга", "+375291112233", ""),
            Err(CartError::Empty)
        );

        cart.set_qty(4, 2);
        let order = checkout(&mut cart, " Ольга ", " +375291112233 ", " к 18:00 ")
            .expect("checkout");
        assert_eq!(order.name, "Ольга");
        assert_eq!(order.phone, "+375291112233");
        assert_eq!(order.comment, "к 18:00");
        assert_eq!(order.items.qty(4), 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn discount_codes_are_trimmed_and_upper_cased() {
        assert_eq!(normalize_discount_code(" spring10 "), Ok("SPRING10".to_string()));
        assert!(normalize_discount_code("  ").is_err());
        assert!(normalize_discount_code(&"A".repeat(21)).is_err());
    }

    #[test]
    fn discount_percent_bounds() {
        assert_eq!(validate_discount_percent(15), Ok(15));
        assert!(validate_discount_percent(0).is_err());
        assert!(validate_discount_percent(101).is_err());
    }

    #[test]
    fn discount_rounds_to_kopecks() {
        assert_eq!(apply_discount(Decimal::new(30000, 2), 10), Decimal::new(27000, 2));
        assert_eq!(apply_discount(Decimal::new(999, 2), 15), Decimal::new(849, 2));
        assert_eq!(apply_discount(Decimal::new(1200, 0), 100), Decimal::ZERO);
    }
}
