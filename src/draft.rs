// src/draft.rs

use crate::error::{ConfigError, InvoiceError};
use crate::invoice::Field;
use crate::logo::{FileLogoSource, Logo};
use crate::render::format_number;
use crate::session::Session;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// A filled-in form stored as TOML, replayed into a session the same way
/// a user would type it.
#[derive(Debug, Default, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_address: String,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// A `data:` URL, or a path relative to the draft file.
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub items: Vec<DraftItem>,
}

#[derive(Debug, Deserialize)]
pub struct DraftItem {
    pub product: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

impl Draft {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut draft: Draft = toml::from_str(&content)?;
        if let (Some(logo), Some(base)) = (&draft.logo, path.parent())
            && !logo.starts_with("data:")
        {
            draft.logo = Some(base.join(logo).display().to_string());
        }
        Ok(draft)
    }

    /// Feed every value through the session's field validation.
    pub async fn apply(&self, session: &mut Session) -> Result<(), InvoiceError> {
        session.update_field(Field::CustomerName, &self.customer_name)?;
        session.update_field(Field::CustomerAddress, &self.customer_address)?;

        for item in &self.items {
            let i = session.add_item();
            session.update_field(Field::Product(i), &item.product)?;
            session.update_field(Field::UnitPrice(i), &format_number(item.price))?;
            session.update_field(Field::Quantity(i), &item.quantity.to_string())?;
        }

        if let Some(discount) = self.discount {
            session.set_discount(&format_number(discount))?;
        }
        if let Some(method) = &self.payment_method {
            session.set_payment_method(method)?;
        }
        match self.logo.as_deref() {
            Some(url) if url.starts_with("data:") => {
                let logo = Logo::from_data_url(url).ok_or(InvoiceError::InvalidLogoUrl)?;
                session.set_logo(logo.bytes, logo.mime);
            }
            Some(path) => {
                session
                    .request_logo_upload(&FileLogoSource::new(path))
                    .await?;
            }
            None => {}
        }

        info!(
            items = self.items.len(),
            total = session.total_amount(),
            "Draft applied"
        );
        Ok(())
    }
}
