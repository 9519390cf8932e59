//! Encoder adapter: text in, raster and SVG out.
//!
//! Symbol construction is delegated to the `qrcode` crate. Both outputs are
//! painted here from the same module grid, so the PNG and the SVG always
//! describe the same symbol with the same quiet zone.

use std::any::Any;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};
use qrstudio_states::State;
use thiserror::Error;

use crate::GenerationRequest;

/// Quiet zone around the symbol, in modules.
pub const MARGIN_MODULES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Text is too long to fit in a QR code at error correction level {level:?}")]
    DataTooLong { level: EcLevel },
    #[error("{modules} modules per side do not fit in {width}px, choose a larger size")]
    SizeTooSmall { modules: u32, width: u32 },
    #[error("Invalid color `{value}`, expected #RRGGBB")]
    InvalidColor { value: String },
    #[error("{0}")]
    Encode(String),
}

impl EncodingError {
    fn from_qr(err: QrError, level: EcLevel) -> Self {
        match err {
            QrError::DataTooLong => Self::DataTooLong { level },
            other => Self::Encode(other.to_string()),
        }
    }
}

/// Parse `#rrggbb` (case-insensitive) into RGB bytes.
pub fn parse_hex_color(value: &str) -> Result<[u8; 3], EncodingError> {
    let invalid = || EncodingError::InvalidColor {
        value: value.to_owned(),
    };

    let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

fn css_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Output edge length in pixels.
    pub width: u32,
    pub margin: u32,
    pub dark: String,
    pub light: String,
    pub ec_level: EcLevel,
}

impl RenderOptions {
    /// Fixed margin and level M, colors and width from the request.
    pub fn for_request(request: &GenerationRequest) -> Self {
        Self {
            width: request.size,
            margin: MARGIN_MODULES,
            dark: request.foreground.clone(),
            light: request.background.clone(),
            ec_level: EcLevel::M,
        }
    }
}

#[async_trait]
pub trait QrEncoder: Send + Sync + std::fmt::Debug {
    async fn encode_raster(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<RgbaImage, EncodingError>;

    async fn encode_svg(&self, text: &str, options: &RenderOptions)
    -> Result<String, EncodingError>;
}

/// Module grid including the quiet zone.
struct ModuleGrid {
    /// Modules per side, quiet zone included.
    side: usize,
    margin: usize,
    symbol: usize,
    colors: Vec<Color>,
}

impl ModuleGrid {
    fn encode(text: &str, options: &RenderOptions) -> Result<Self, EncodingError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), options.ec_level)
            .map_err(|err| EncodingError::from_qr(err, options.ec_level))?;
        let symbol = code.width();
        let margin = options.margin as usize;

        Ok(Self {
            side: symbol + 2 * margin,
            margin,
            symbol,
            colors: code.to_colors(),
        })
    }

    fn is_dark(&self, x: usize, y: usize) -> bool {
        let (Some(x), Some(y)) = (x.checked_sub(self.margin), y.checked_sub(self.margin)) else {
            return false;
        };
        x < self.symbol && y < self.symbol && self.colors[y * self.symbol + x] == Color::Dark
    }
}

/// Nearest module for a pixel along one axis.
fn module_at(pixel: usize, side: usize, pixels: usize) -> usize {
    pixel * side / pixels
}

/// The default encoder, backed by the `qrcode` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeEncoder;

impl QrCodeEncoder {
    pub fn raster(text: &str, options: &RenderOptions) -> Result<RgbaImage, EncodingError> {
        let [dr, dg, db] = parse_hex_color(&options.dark)?;
        let [lr, lg, lb] = parse_hex_color(&options.light)?;
        let grid = ModuleGrid::encode(text, options)?;

        let width = options.width.max(1);
        let pixels = width as usize;
        // Every module needs at least one pixel, or rows and columns vanish.
        if grid.side > pixels {
            return Err(EncodingError::SizeTooSmall {
                modules: u32::try_from(grid.side).unwrap_or(u32::MAX),
                width,
            });
        }
        let dark = Rgba([dr, dg, db, 255]);
        let light = Rgba([lr, lg, lb, 255]);

        Ok(RgbaImage::from_fn(width, width, |x, y| {
            let mx = module_at(x as usize, grid.side, pixels);
            let my = module_at(y as usize, grid.side, pixels);
            if grid.is_dark(mx, my) { dark } else { light }
        }))
    }

    pub fn svg(text: &str, options: &RenderOptions) -> Result<String, EncodingError> {
        let dark = css_hex(parse_hex_color(&options.dark)?);
        let light = css_hex(parse_hex_color(&options.light)?);
        let grid = ModuleGrid::encode(text, options)?;
        let side = grid.side;
        let width = options.width;

        let mut path = String::new();
        for y in 0..side {
            let mut x = 0;
            while x < side {
                if !grid.is_dark(x, y) {
                    x += 1;
                    continue;
                }
                let start = x;
                while x < side && grid.is_dark(x, y) {
                    x += 1;
                }
                let run = x - start;
                let _ = write!(path, "M{start} {y}h{run}v1h-{run}z");
            }
        }

        Ok(format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "\n",
                r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{width}" height="{width}" viewBox="0 0 {side} {side}" shape-rendering="crispEdges">"#,
                r#"<rect width="{side}" height="{side}" fill="{light}"/>"#,
                r#"<path fill="{dark}" d="{path}"/>"#,
                "</svg>\n"
            ),
            width = width,
            side = side,
            light = light,
            dark = dark,
            path = path,
        ))
    }
}

#[async_trait]
impl QrEncoder for QrCodeEncoder {
    async fn encode_raster(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<RgbaImage, EncodingError> {
        Self::raster(text, options)
    }

    async fn encode_svg(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<String, EncodingError> {
        Self::svg(text, options)
    }
}

/// Holds the encoder the generation command calls.
#[derive(Debug, Clone)]
pub struct QrEncoderState {
    inner: Arc<dyn QrEncoder>,
}

impl Default for QrEncoderState {
    fn default() -> Self {
        Self::new(Arc::new(QrCodeEncoder))
    }
}

impl QrEncoderState {
    pub fn new(inner: Arc<dyn QrEncoder>) -> Self {
        Self { inner }
    }

    pub fn encoder(&self) -> Arc<dyn QrEncoder> {
        Arc::clone(&self.inner)
    }
}

impl State for QrEncoderState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: u32) -> RenderOptions {
        RenderOptions {
            width,
            margin: MARGIN_MODULES,
            dark: "#000000".to_owned(),
            light: "#FFFFFF".to_owned(),
            ec_level: EcLevel::M,
        }
    }

    #[test]
    fn parse_hex_color_accepts_both_cases() {
        assert_eq!(parse_hex_color("#1e40AF"), Ok([0x1e, 0x40, 0xaf]));
        assert_eq!(parse_hex_color(" #ffffff "), Ok([255, 255, 255]));
    }

    #[test]
    fn parse_hex_color_rejects_malformed_values() {
        for value in ["", "000000", "#fff", "#12345g", "#1234567", "#ééé"] {
            assert!(
                matches!(parse_hex_color(value), Err(EncodingError::InvalidColor { .. })),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn raster_matches_requested_width() {
        for width in [128, 256, 480, 512] {
            let image = QrCodeEncoder::raster("https://example.com", &options(width))
                .expect("encodes");
            assert_eq!(image.dimensions(), (width, width));
        }
    }

    #[test]
    fn raster_has_light_quiet_zone_and_dark_finder() {
        let image = QrCodeEncoder::raster("hello", &options(256)).expect("encodes");

        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        // "hello" is a version 1 symbol: 21 + 2 * 2 = 25 modules, so the
        // finder pattern's top-left corner starts just past 20px.
        assert_eq!(image.get_pixel(24, 24), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn raster_and_svg_are_deterministic() {
        let first = QrCodeEncoder::raster("same input", &options(256)).expect("encodes");
        let second = QrCodeEncoder::raster("same input", &options(256)).expect("encodes");
        assert_eq!(first.as_raw(), second.as_raw());

        let first = QrCodeEncoder::svg("same input", &options(256)).expect("encodes");
        let second = QrCodeEncoder::svg("same input", &options(256)).expect("encodes");
        assert_eq!(first, second);
    }

    #[test]
    fn svg_declares_size_viewbox_and_colors() {
        let mut opts = options(256);
        opts.dark = "#1E40AF".to_owned();
        opts.light = "#dbeafe".to_owned();
        let svg = QrCodeEncoder::svg("hello", &opts).expect("encodes");

        assert!(svg.contains(r#"width="256""#));
        assert!(svg.contains(r#"height="256""#));
        assert!(svg.contains(r#"viewBox="0 0 25 25""#));
        assert!(svg.contains(r##"fill="#1e40af""##));
        assert!(svg.contains(r##"fill="#dbeafe""##));
        assert!(svg.contains("M2 2h7v1h-7z"), "top finder row should be one run");
    }

    /// Alphanumeric capacity of a version 40 symbol at level M.
    const MAX_ALPHANUMERIC_M: usize = 3391;

    #[test]
    fn oversized_text_fails_with_data_too_long() {
        let text = "A".repeat(4000);
        let err = QrCodeEncoder::raster(&text, &options(512)).expect_err("too long");

        assert_eq!(err, EncodingError::DataTooLong { level: EcLevel::M });
        assert!(!err.to_string().is_empty());
        assert!(QrCodeEncoder::svg(&text, &options(512)).is_err());
    }

    #[test]
    fn capacity_boundary_at_level_m() {
        let fits = "A".repeat(MAX_ALPHANUMERIC_M);
        let image = QrCodeEncoder::raster(&fits, &options(512)).expect("largest payload fits");
        assert_eq!(image.dimensions(), (512, 512));

        let overflow = "A".repeat(MAX_ALPHANUMERIC_M + 1);
        assert_eq!(
            QrCodeEncoder::raster(&overflow, &options(512)),
            Err(EncodingError::DataTooLong { level: EcLevel::M })
        );
    }

    #[test]
    fn raster_too_small_for_symbol_is_rejected() {
        let text = "a".repeat(1800);
        let err = QrCodeEncoder::raster(&text, &options(128)).expect_err("too small");

        match err {
            EncodingError::SizeTooSmall { modules, width } => {
                assert!(modules > 128, "modules = {modules}");
                assert_eq!(width, 128);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The vector output has no pixel budget.
        assert!(QrCodeEncoder::svg(&text, &options(128)).is_ok());
    }

    #[test]
    fn every_module_is_sampled_when_raster_fits() {
        let text = "a".repeat(1800);
        let grid = ModuleGrid::encode(&text, &options(512)).expect("encodes");
        assert!(grid.side > 128 && grid.side <= 512);

        let mut sampled = vec![false; grid.side];
        for pixel in 0..512 {
            sampled[module_at(pixel, grid.side, 512)] = true;
        }
        assert!(sampled.iter().all(|hit| *hit), "a module column was skipped");

        let image = QrCodeEncoder::raster(&text, &options(512)).expect("fits");
        assert_eq!(image.dimensions(), (512, 512));
    }

    #[test]
    fn invalid_colors_fail_before_encoding() {
        let mut opts = options(256);
        opts.light = "white".to_owned();

        assert_eq!(
            QrCodeEncoder::raster("hello", &opts),
            Err(EncodingError::InvalidColor {
                value: "white".to_owned()
            })
        );
    }
}
