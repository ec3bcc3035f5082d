//! Text measurement.
//!
//! Sizing only needs "how wide is this string in this font". Native builds
//! (tests, CLI, benches) use a deterministic per-character estimate; the
//! browser build measures with an offscreen canvas.

use crate::config::GridConfig;

/// Which font a string is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Cell,
    Header,
}

pub trait TextMeasure {
    /// Rendered width of `text` in logical pixels
    fn measure(&self, text: &str, font: Font) -> f32;
}

/// Fixed average width per character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharWidthMeasure {
    pub cell: f32,
    pub header: f32,
}

impl CharWidthMeasure {
    pub fn new(cell: f32, header: f32) -> Self {
        Self { cell, header }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.char_width, config.header_char_width)
    }
}

impl Default for CharWidthMeasure {
    fn default() -> Self {
        Self::from_config(&GridConfig::default())
    }
}

impl TextMeasure for CharWidthMeasure {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font: Font) -> f32 {
        let per_char = match font {
            Font::Cell => self.cell,
            Font::Header => self.header,
        };
        text.chars().count() as f32 * per_char
    }
}

/// Canvas `measureText` with a per-character fallback when the context is
/// unavailable or measurement fails
#[cfg(target_arch = "wasm32")]
pub struct CanvasMeasure {
    ctx: Option<web_sys::CanvasRenderingContext2d>,
    cell_font: String,
    header_font: String,
    fallback: CharWidthMeasure,
}

#[cfg(target_arch = "wasm32")]
impl CanvasMeasure {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            ctx: Self::offscreen_context(),
            cell_font: config.cell_font.clone(),
            header_font: config.header_font.clone(),
            fallback: CharWidthMeasure::from_config(config),
        }
    }

    fn offscreen_context() -> Option<web_sys::CanvasRenderingContext2d> {
        use wasm_bindgen::JsCast;

        let document = web_sys::window()?.document()?;
        let canvas: web_sys::HtmlCanvasElement = document
            .create_element("canvas")
            .ok()?
            .dyn_into()
            .ok()?;
        canvas.get_context("2d").ok()??.dyn_into().ok()
    }
}

#[cfg(target_arch = "wasm32")]
impl TextMeasure for CanvasMeasure {
    #[allow(clippy::cast_possible_truncation)]
    fn measure(&self, text: &str, font: Font) -> f32 {
        let Some(ctx) = &self.ctx else {
            return self.fallback.measure(text, font);
        };
        ctx.set_font(match font {
            Font::Cell => &self.cell_font,
            Font::Header => &self.header_font,
        });
        ctx.measure_text(text)
            .map(|m| m.width() as f32)
            .unwrap_or_else(|_| self.fallback.measure(text, font))
    }
}
