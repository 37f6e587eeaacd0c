// src/invoice/mod.rs

pub mod validate;

use crate::error::{InvoiceError, ValidationError};
use crate::logo::Logo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            product: String::new(),
            unit_price: 0.0,
            quantity: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("cash"),
            PaymentMethod::Card => f.write_str("card"),
        }
    }
}

/// Addresses one editable value of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    CustomerName,
    CustomerAddress,
    Discount,
    PaymentMethod,
    Product(usize),
    UnitPrice(usize),
    Quantity(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::CustomerName => f.write_str("customer_name"),
            Field::CustomerAddress => f.write_str("customer_address"),
            Field::Discount => f.write_str("discount"),
            Field::PaymentMethod => f.write_str("payment_method"),
            Field::Product(i) => write!(f, "items.{i}.product"),
            Field::UnitPrice(i) => write!(f, "items.{i}.price"),
            Field::Quantity(i) => write!(f, "items.{i}.quantity"),
        }
    }
}

impl FromStr for Field {
    type Err = InvoiceError;

    /// Accepts `customer_name`, `discount`, `items.2.price` and the
    /// camelCase spellings used by form controls (`customerName`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || InvoiceError::UnknownField(s.to_string());
        match s {
            "customer_name" | "customerName" => return Ok(Field::CustomerName),
            "customer_address" | "customerAddress" => return Ok(Field::CustomerAddress),
            "discount" => return Ok(Field::Discount),
            "payment_method" | "paymentMethod" => return Ok(Field::PaymentMethod),
            _ => {}
        }

        let mut parts = s.split('.');
        let (Some("items"), Some(index), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(unknown());
        };
        let index: usize = index.parse().map_err(|_| unknown())?;
        match name {
            "product" => Ok(Field::Product(index)),
            "price" | "unit_price" => Ok(Field::UnitPrice(index)),
            "quantity" | "qty" => Ok(Field::Quantity(index)),
            _ => Err(unknown()),
        }
    }
}

/// Everything the form holds for one invoice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceState {
    pub customer_name: String,
    pub customer_address: String,
    pub items: Vec<LineItem>,
    pub discount_percent: f64,
    pub payment_method: PaymentMethod,
    pub logo: Option<Logo>,
}

impl InvoiceState {
    pub fn add_item(&mut self) -> usize {
        self.items.push(LineItem::default());
        self.items.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, InvoiceError> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Apply a raw form value. Rejected values leave the state untouched.
    pub fn update_field(&mut self, field: Field, value: &str) -> Result<(), InvoiceError> {
        match field {
            Field::CustomerName => {
                self.customer_name = validate::required_text(field, value)?;
            }
            Field::CustomerAddress => {
                self.customer_address = validate::required_text(field, value)?;
            }
            Field::Discount => {
                self.discount_percent = validate::discount(value);
            }
            Field::PaymentMethod => {
                self.payment_method = validate::payment_method(value)?;
            }
            Field::Product(i) => {
                self.check_index(i)?;
                self.items[i].product = validate::product(i, value)?;
            }
            Field::UnitPrice(i) => {
                self.check_index(i)?;
                self.items[i].unit_price = validate::unit_price(i, value)?;
            }
            Field::Quantity(i) => {
                self.check_index(i)?;
                self.items[i].quantity = validate::quantity(i, value)?;
            }
        }
        Ok(())
    }

    /// Every constraint the form enforces before it can be submitted.
    /// Empty when the invoice is ready to render.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Err(e) = validate::required_text(Field::CustomerName, &self.customer_name) {
            errors.push(e);
        }
        if let Err(e) = validate::required_text(Field::CustomerAddress, &self.customer_address) {
            errors.push(e);
        }
        for (i, item) in self.items.iter().enumerate() {
            if let Err(e) = validate::product(i, &item.product) {
                errors.push(e);
            }
            if let Err(e) = validate::check_unit_price(i, item.unit_price) {
                errors.push(e);
            }
            if item.quantity < 1 {
                errors.push(ValidationError::new(
                    Field::Quantity(i),
                    "must be at least 1",
                ));
            }
        }

        errors
    }

    fn check_index(&self, index: usize) -> Result<(), InvoiceError> {
        if index >= self.items.len() {
            return Err(InvoiceError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }
}
