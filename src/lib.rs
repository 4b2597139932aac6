//! qrgen - QR code symbol encoder
//!
//! Turns text or bytes into a QR Code Model 2 symbol (versions 1-40, error
//! correction levels L/M/Q/H) and renders it as an RGBA raster, PNG bytes,
//! a `data:` URL or terminal text.
//!
//! # Example
//! ```
//! use qrgen::{ECLevel, encode, render};
//!
//! let code = encode(b"HELLO WORLD", ECLevel::Q, None).unwrap();
//! assert_eq!(code.size(), 21);
//! let png = render::to_png(&code, &render::RenderOptions::default()).unwrap();
//! assert!(!png.is_empty());
//! ```

/// Environment-driven tuning knobs
mod config;
/// Encoding pipeline (segmentation, codewords, placement, masking)
pub mod encoder;
/// Error types
pub mod error;
/// Core data structures (QRCode, BitMatrix, Version, ...)
pub mod models;
/// Clean-grid symbol reader
pub mod reader;
/// Raster, PNG, data URL and terminal rendering
pub mod render;

pub use encoder::{Charset, EncodeOptions, encode, encode_with};
pub use error::{QrError, ReadError};
pub use models::{BitMatrix, ECLevel, MaskPattern, QRCode, Version};
pub use reader::{Decoded, read};
