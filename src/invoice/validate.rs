use super::{Field, PaymentMethod};
use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z ]+$").unwrap());

// ---------------------------------------------------------------------------
// Customer fields
// ---------------------------------------------------------------------------

/// Name and address only need to be present; whitespace does not count.
pub fn required_text(field: Field, value: &str) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// Line item fields
// ---------------------------------------------------------------------------

pub fn product(index: usize, value: &str) -> Result<String, ValidationError> {
    let field = Field::Product(index);
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if !PRODUCT_RE.is_match(value) {
        return Err(ValidationError::new(
            field,
            "may only contain letters and spaces",
        ));
    }
    Ok(value.to_string())
}

pub fn unit_price(index: usize, value: &str) -> Result<f64, ValidationError> {
    let field = Field::UnitPrice(index);
    let raw = value.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    let price: f64 = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("'{raw}' is not a number")))?;
    check_unit_price(index, price)
}

pub fn check_unit_price(index: usize, price: f64) -> Result<f64, ValidationError> {
    let field = Field::UnitPrice(index);
    if !price.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if price < 0.0 {
        return Err(ValidationError::new(field, "must be at least 0"));
    }
    Ok(price)
}

pub fn quantity(index: usize, value: &str) -> Result<u32, ValidationError> {
    let field = Field::Quantity(index);
    let raw = value.trim();
    if raw.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    // Parse as signed first so "-2" reports the range rather than a parse failure.
    let qty: i64 = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("'{raw}' is not a whole number")))?;
    if qty < 1 {
        return Err(ValidationError::new(field, "must be at least 1"));
    }
    u32::try_from(qty).map_err(|_| ValidationError::new(field, "is too large"))
}

// ---------------------------------------------------------------------------
// Discount / payment
// ---------------------------------------------------------------------------

/// Blank, non-numeric or non-finite input counts as no discount.
/// Out-of-range values are kept as entered.
pub fn discount(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .unwrap_or(0.0)
}

pub fn payment_method(value: &str) -> Result<PaymentMethod, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "cash" => Ok(PaymentMethod::Cash),
        "card" => Ok(PaymentMethod::Card),
        other => Err(ValidationError::new(
            Field::PaymentMethod,
            format!("'{other}' is not one of cash, card"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_letters_and_spaces() {
        assert_eq!(product(0, "Widget One").unwrap(), "Widget One");
        assert!(product(0, "Widget1").is_err());
        assert!(product(0, "Pen-Ink").is_err());
        assert!(product(0, "").is_err());
        assert!(product(0, "   ").is_err());
    }

    #[test]
    fn test_unit_price() {
        assert_eq!(unit_price(0, "2.5").unwrap(), 2.5);
        assert_eq!(unit_price(0, "0").unwrap(), 0.0);
        assert!(unit_price(0, "-5").is_err());
        assert!(unit_price(0, "abc").is_err());
        assert!(unit_price(0, "").is_err());
        assert!(unit_price(0, "inf").is_err());
    }

    #[test]
    fn test_quantity() {
        assert_eq!(quantity(1, "3").unwrap(), 3);
        let err = quantity(1, "0").unwrap_err();
        assert_eq!(err.field, Field::Quantity(1));
        assert!(quantity(1, "-2").is_err());
        assert!(quantity(1, "2.5").is_err());
    }

    #[test]
    fn test_discount_coercion() {
        assert_eq!(discount("10"), 10.0);
        assert_eq!(discount(" 12.5 "), 12.5);
        assert_eq!(discount(""), 0.0);
        assert_eq!(discount("ten"), 0.0);
        assert_eq!(discount("NaN"), 0.0);
        // not clamped
        assert_eq!(discount("150"), 150.0);
    }

    #[test]
    fn test_payment_method() {
        assert_eq!(payment_method("Card").unwrap(), PaymentMethod::Card);
        assert_eq!(payment_method("cash").unwrap(), PaymentMethod::Cash);
        assert!(payment_method("cheque").is_err());
    }
}
