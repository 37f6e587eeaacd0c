// src/totals.rs

use crate::invoice::LineItem;
use serde::Serialize;

/// Derived amounts for one state of the form. No currency rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComputedTotals {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub total: f64,
}

pub fn compute_item_amount(item: &LineItem) -> f64 {
    item.unit_price * f64::from(item.quantity)
}

pub fn compute_totals(items: &[LineItem], discount_percent: f64) -> ComputedTotals {
    let subtotal: f64 = items.iter().map(compute_item_amount).sum();
    let discount_amount = subtotal * discount_percent / 100.0;
    ComputedTotals {
        subtotal,
        discount_amount,
        total: subtotal - discount_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product: &str, unit_price: f64, quantity: u32) -> LineItem {
        LineItem {
            product: product.to_string(),
            unit_price,
            quantity,
        }
    }

    #[test]
    fn test_item_amount_is_exact_product() {
        for (price, qty) in [(0.0, 1), (2.0, 3), (19.99, 7), (0.1, 3), (1e6, 250)] {
            let it = item("Pen", price, qty);
            assert_eq!(compute_item_amount(&it), price * qty as f64);
        }
    }

    #[test]
    fn test_pen_scenario() {
        let totals = compute_totals(&[item("Pen", 2.0, 3)], 10.0);
        assert_eq!(totals.subtotal, 6.0);
        assert!((totals.discount_amount - 0.6).abs() < 1e-12);
        assert!((totals.total - 5.4).abs() < 1e-12);
    }

    #[test]
    fn test_total_never_exceeds_subtotal_in_range() {
        let items = vec![item("Pen", 2.5, 4), item("Ink", 7.25, 1), item("Pad", 0.0, 9)];
        for d in [0.0, 0.5, 10.0, 33.3, 99.9, 100.0] {
            let t = compute_totals(&items, d);
            assert_eq!(t.subtotal, 17.25);
            assert_eq!(t.total, t.subtotal - t.subtotal * d / 100.0);
            assert!(t.total <= t.subtotal);
        }
    }

    #[test]
    fn test_empty_items() {
        assert_eq!(compute_totals(&[], 50.0), ComputedTotals::default());
    }

    #[test]
    fn test_discount_not_clamped() {
        let t = compute_totals(&[item("Pen", 10.0, 1)], 150.0);
        assert_eq!(t.total, -5.0);
    }
}
