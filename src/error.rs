use crate::font::FontId;
use thiserror::Error;

/// Coarse grouping so callers can tell "bad data" from "system unavailable"
/// from "bug in the caller or in this crate".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Resource,
    Defect,
}

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("invalid invoice: {0}")]
    InvalidInput(String),
    #[error("font unavailable: {0}")]
    FontLoad(String),
    #[error("invalid page size {width}x{height}pt")]
    InvalidPageSize { width: f32, height: f32 },
    #[error("font {0:?} is not registered")]
    UnknownFont(FontId),
    #[error("content cannot be placed on an empty page: {0}")]
    Unplaceable(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvoiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            InvoiceError::InvalidInput(_) => ErrorClass::Input,
            InvoiceError::FontLoad(_) | InvoiceError::Io(_) => ErrorClass::Resource,
            InvoiceError::InvalidPageSize { .. }
            | InvoiceError::UnknownFont(_)
            | InvoiceError::Unplaceable(_)
            | InvoiceError::InvalidConfiguration(_)
            | InvoiceError::Serialization(_) => ErrorClass::Defect,
        }
    }
}
