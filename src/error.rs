// src/error.rs

use crate::invoice::Field;
use thiserror::Error;

/// A single field that failed its constraint.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invoice is incomplete: {} field(s) invalid", .0.len())]
    Incomplete(Vec<ValidationError>),

    #[error("Item index {index} out of range (items: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown field path: {0}")]
    UnknownField(String),

    #[error("Invalid logo data URL")]
    InvalidLogoUrl,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Unsupported logo image type: {0}")]
    UnsupportedImage(String),

    #[error("Corrupt logo image: {0}")]
    CorruptImage(String),

    #[error("Failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
