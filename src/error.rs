/// Errors raised while encoding or rendering a symbol.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("No text provided for QR code generation")]
    EmptyInput,

    #[error("Unsupported character at byte {position}: {reason}")]
    UnsupportedCharacter { position: usize, reason: String },

    #[error(
        "Data too large: {needed_bits} bits needed, {capacity_bits} bits available (version {version})"
    )]
    DataTooLarge {
        needed_bits: usize,
        capacity_bits: usize,
        version: u8,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised while reading a module grid back into its payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("Matrix of {width}x{height} modules is not a QR symbol")]
    InvalidDimension { width: usize, height: usize },

    #[error("Format information is unreadable")]
    FormatInfo,

    #[error("Version information is unreadable or disagrees with the symbol size")]
    VersionInfo,

    #[error("Error correction check failed in block {block}")]
    Checksum { block: usize },

    #[error("Malformed segment stream: {0}")]
    Segment(String),
}
