//! Converter module
//!
//! Pure distance conversion logic: the registry of supported conversions,
//! request validation, value parsing and the error type shared by the
//! request handlers.

mod error;
mod registry;
mod request;

pub use error::ConvertError;
pub use registry::{ConversionRegistry, ConversionResult};
pub use request::ConversionRequest;
