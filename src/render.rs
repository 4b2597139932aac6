//! Rendering of finished symbols.
//!
//! Modules are mapped to pixels by nearest neighbour on each axis, so a
//! 256x256 raster of a 21-module symbol gets modules 12 or 13 pixels wide.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::error::QrError;
use crate::models::QRCode;

/// Largest accepted raster edge
pub const MAX_DIMENSION: u32 = 8192;

const DATA_URL_PREFIX: &str = "data:image/png;base64,";
const FILE_NAME_LEN: usize = 30;

/// Opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 0xFF,
        g: 0xFF,
        b: 0xFF,
    };

    /// Parse `#rgb` or `#rrggbb` (the `#` is optional)
    pub fn from_hex(hex: &str) -> Result<Self, QrError> {
        let invalid = || QrError::InvalidParameter(format!("invalid colour {hex:?}"));
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let mut c = [0u8; 3];
                for (slot, i) in c.iter_mut().zip(0..3) {
                    *slot = channel(&digits[i..i + 1])? * 0x11;
                }
                Ok(Color {
                    r: c[0],
                    g: c[1],
                    b: c[2],
                })
            }
            6 => Ok(Color {
                r: channel(&digits[0..2])?,
                g: channel(&digits[2..4])?,
                b: channel(&digits[4..6])?,
            }),
            _ => Err(invalid()),
        }
    }

    fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 0xFF])
    }
}

impl FromStr for Color {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Raster parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Raster width in pixels
    pub width: u32,
    /// Raster height in pixels
    pub height: u32,
    pub dark: Color,
    pub light: Color,
    /// Light border in modules on each side
    pub quiet_zone: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            dark: Color::BLACK,
            light: Color::WHITE,
            quiet_zone: 0,
        }
    }
}

/// Modules across the symbol plus its quiet zone on both sides
fn module_span(size: usize, quiet_zone: usize) -> Result<usize, QrError> {
    quiet_zone
        .checked_mul(2)
        .and_then(|q| q.checked_add(size))
        .filter(|&span| span <= MAX_DIMENSION as usize)
        .ok_or_else(|| QrError::InvalidParameter(format!("quiet zone {quiet_zone} too large")))
}

impl RenderOptions {
    fn validate(&self, modules: u32) -> Result<(), QrError> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value < modules || value > MAX_DIMENSION {
                return Err(QrError::InvalidParameter(format!(
                    "{name} {value} outside {modules}..={MAX_DIMENSION} pixels"
                )));
            }
        }
        Ok(())
    }
}

/// Rasterize `code` into an RGBA image of exactly `width` x `height` pixels.
pub fn to_image(code: &QRCode, options: &RenderOptions) -> Result<RgbaImage, QrError> {
    let size = code.size() as u32;
    let span = module_span(code.size(), options.quiet_zone as usize)? as u32;
    options.validate(span)?;

    let dark = options.dark.to_rgba();
    let light = options.light.to_rgba();
    let column = |px: u32| u64::from(px) * u64::from(span) / u64::from(options.width);
    let row = |py: u32| u64::from(py) * u64::from(span) / u64::from(options.height);
    let module = |m: u64| (m as u32).checked_sub(options.quiet_zone).filter(|&v| v < size);

    Ok(RgbaImage::from_fn(options.width, options.height, |px, py| {
        match (module(column(px)), module(row(py))) {
            (Some(x), Some(y)) if code.is_dark(x as usize, y as usize) => dark,
            _ => light,
        }
    }))
}

/// Encode the raster as PNG bytes
pub fn to_png(code: &QRCode, options: &RenderOptions) -> Result<Vec<u8>, QrError> {
    let image = DynamicImage::ImageRgba8(to_image(code, options)?);
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// `data:image/png;base64,...` URL of the PNG
pub fn to_data_url(code: &QRCode, options: &RenderOptions) -> Result<String, QrError> {
    let png = to_png(code, options)?;
    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}

/// Render with Unicode half blocks, two module rows per line. Dark modules
/// are drawn as ink, so the output suits a light terminal background.
pub fn to_text(code: &QRCode, quiet_zone: usize) -> Result<String, QrError> {
    let size = code.size();
    let span = module_span(size, quiet_zone)?;
    let dark = |x: usize, y: usize| {
        x >= quiet_zone
            && y >= quiet_zone
            && x - quiet_zone < size
            && y - quiet_zone < size
            && code.is_dark(x - quiet_zone, y - quiet_zone)
    };

    let mut out = String::with_capacity((span + 1) * span.div_ceil(2) * 3);
    for y in (0..span).step_by(2) {
        for x in 0..span {
            out.push(match (dark(x, y), dark(x, y + 1)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    Ok(out)
}

/// Download file name for `text`, lowercased and cut to 30 characters,
/// `qrcode` when empty. Works on UTF-16 code units: every unit outside
/// `[A-Za-z0-9]` becomes `_`, so a character outside the BMP gives `__`.
pub fn file_name_for(text: &str) -> String {
    let stem: String = text
        .encode_utf16()
        .map(|unit| match u8::try_from(unit) {
            Ok(b) if b.is_ascii_alphanumeric() => char::from(b.to_ascii_lowercase()),
            _ => '_',
        })
        .take(FILE_NAME_LEN)
        .collect();
    if stem.is_empty() {
        "qrcode.png".to_string()
    } else {
        format!("{stem}.png")
    }
}
