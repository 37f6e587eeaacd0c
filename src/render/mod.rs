// src/render/mod.rs

pub mod export;
pub mod pdf;

use crate::invoice::InvoiceState;
use crate::logo::Logo;
use crate::totals::{self, ComputedTotals};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Default file name for saved invoices.
pub const DEFAULT_FILE_NAME: &str = "invoice.pdf";

/// Fixed positions of every block on the page, in millimetres measured
/// from the top-left corner. Text `y` values are baselines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub page_width: f32,
    pub page_height: f32,
    pub font_size: f32,
    pub logo_x: f32,
    pub logo_y: f32,
    pub logo_width: f32,
    pub logo_height: f32,
    pub title: String,
    pub title_x: f32,
    pub title_y: f32,
    pub left_x: f32,
    pub customer_y: f32,
    pub address_y: f32,
    pub header_y: f32,
    /// Product, Price, Qty, Amount.
    pub columns: [f32; 4],
    pub row_height: f32,
    pub summary_gap: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            font_size: 16.0,
            logo_x: 10.0,
            logo_y: 10.0,
            logo_width: 35.0,
            logo_height: 35.0,
            title: "INVOICE".to_string(),
            title_x: 85.0,
            title_y: 15.0,
            left_x: 10.0,
            customer_y: 50.0,
            address_y: 60.0,
            header_y: 80.0,
            columns: [10.0, 60.0, 90.0, 120.0],
            row_height: 10.0,
            summary_gap: 20.0,
        }
    }
}

/// One immutable draw call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Text {
        x: f32,
        y: f32,
        text: String,
    },
    /// `(x, y)` is the top-left corner of the image box.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        logo: Logo,
    },
}

/// A frozen copy of the form plus the totals derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: InvoiceState,
    pub totals: ComputedTotals,
}

impl Snapshot {
    pub fn of(state: &InvoiceState) -> Self {
        Self {
            state: state.clone(),
            totals: totals::compute_totals(&state.items, state.discount_percent),
        }
    }
}

/// The laid-out invoice: page geometry and draw calls in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub page_width: f32,
    pub page_height: f32,
    pub font_size: f32,
    pub instructions: Vec<Instruction>,
}

impl RenderedDocument {
    /// SHA-256 over the page geometry and every instruction. Equal
    /// layouts always give equal fingerprints.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for v in [self.page_width, self.page_height, self.font_size] {
            hasher.update(v.to_le_bytes());
        }
        for ins in &self.instructions {
            match ins {
                Instruction::Text { x, y, text } => {
                    hasher.update(b"T");
                    hasher.update(x.to_le_bytes());
                    hasher.update(y.to_le_bytes());
                    hasher.update((text.len() as u64).to_le_bytes());
                    hasher.update(text.as_bytes());
                }
                Instruction::Image {
                    x,
                    y,
                    width,
                    height,
                    logo,
                } => {
                    hasher.update(b"I");
                    for v in [x, y, width, height] {
                        hasher.update(v.to_le_bytes());
                    }
                    hasher.update(logo.mime.as_bytes());
                    hasher.update((logo.bytes.len() as u64).to_le_bytes());
                    hasher.update(&logo.bytes);
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// All text draw calls as `(x, y, text)`.
    pub fn texts(&self) -> impl Iterator<Item = (f32, f32, &str)> {
        self.instructions.iter().filter_map(|ins| match ins {
            Instruction::Text { x, y, text } => Some((*x, *y, text.as_str())),
            Instruction::Image { .. } => None,
        })
    }
}

/// Collects draw calls in order.
struct Builder {
    instructions: Vec<Instruction>,
}

impl Builder {
    fn text(&mut self, x: f32, y: f32, text: impl Into<String>) {
        self.instructions.push(Instruction::Text {
            x,
            y,
            text: text.into(),
        });
    }

    fn image(&mut self, x: f32, y: f32, width: f32, height: f32, logo: &Logo) {
        self.instructions.push(Instruction::Image {
            x,
            y,
            width,
            height,
            logo: logo.clone(),
        });
    }
}

/// Lay out the invoice page for `snapshot`.
pub fn render(snapshot: &Snapshot, layout: &Layout) -> RenderedDocument {
    let state = &snapshot.state;
    let mut b = Builder {
        instructions: Vec::with_capacity(10 + 4 * state.items.len()),
    };

    if let Some(logo) = &state.logo {
        b.image(
            layout.logo_x,
            layout.logo_y,
            layout.logo_width,
            layout.logo_height,
            logo,
        );
    }

    b.text(layout.title_x, layout.title_y, layout.title.as_str());
    b.text(
        layout.left_x,
        layout.customer_y,
        format!("Customer: {}", state.customer_name),
    );
    b.text(
        layout.left_x,
        layout.address_y,
        format!("Address: {}", state.customer_address),
    );

    let [product_x, price_x, qty_x, amount_x] = layout.columns;
    let mut y = layout.header_y;
    b.text(product_x, y, "Product");
    b.text(price_x, y, "Price");
    b.text(qty_x, y, "Qty");
    b.text(amount_x, y, "Amount");

    for item in &state.items {
        y += layout.row_height;
        b.text(product_x, y, item.product.as_str());
        b.text(price_x, y, format_number(item.unit_price));
        b.text(qty_x, y, item.quantity.to_string());
        b.text(amount_x, y, format_number(totals::compute_item_amount(item)));
    }

    y += layout.summary_gap;
    b.text(
        layout.left_x,
        y,
        format!("Discount: {}%", format_number(state.discount_percent)),
    );
    y += layout.row_height;
    b.text(
        layout.left_x,
        y,
        format!("Total Amount: {}", format_number(snapshot.totals.total)),
    );
    y += layout.row_height;
    b.text(
        layout.left_x,
        y,
        format!("Payment Method: {}", state.payment_method),
    );

    debug!(
        instructions = b.instructions.len(),
        items = state.items.len(),
        has_logo = state.logo.is_some(),
        "Invoice laid out"
    );

    RenderedDocument {
        page_width: layout.page_width,
        page_height: layout.page_height,
        font_size: layout.font_size,
        instructions: b.instructions,
    }
}

/// Shortest round-trip decimal form (`6`, `0.6`, `5.4`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    value.to_string()
}
