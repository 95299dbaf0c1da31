//! Composite post image: the generated picture with a caption/hashtag footer.
//!
//! The canvas is the source image plus a [`FOOTER_HEIGHT`] band shaded with
//! 60% black. The caption is wrapped greedily to `width - 40` px and drawn
//! centred, one line every [`LINE_HEIGHT`] px starting 40 px below the image;
//! the hashtags follow 40 px under the last caption line in a smaller face.
//!
//! Glyphs come from the 8×8 `font8x8` bitmaps scaled up, so every measurement
//! is an exact function of character count and needs no font files.
//! Characters without a bitmap still take up an advance. Anything that falls
//! outside the canvas is clipped.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{imageops, DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, info};

pub const FOOTER_HEIGHT: u32 = 200;
pub const FOOTER_OPACITY: f32 = 0.6;
/// Total horizontal margin subtracted from the canvas width when wrapping.
pub const SIDE_PADDING: u32 = 40;
pub const LINE_HEIGHT: u32 = 30;
/// Distance from the bottom of the image to the first caption baseline.
pub const FIRST_BASELINE_OFFSET: u32 = 40;
/// Distance from the last caption baseline to the hashtag baseline.
pub const HASHTAG_OFFSET: u32 = 40;

const GLYPH_CELL: u32 = 8;

/// Scale applied to the 8×8 bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphStyle {
    pub scale_x: u32,
    pub scale_y: u32,
    /// Thickens strokes by one pixel to the right.
    pub bold: bool,
}

/// 24 px tall bold face for the caption.
pub const CAPTION_STYLE: GlyphStyle = GlyphStyle {
    scale_x: 2,
    scale_y: 3,
    bold: true,
};

/// 16 px tall face for the hashtag line.
pub const HASHTAG_STYLE: GlyphStyle = GlyphStyle {
    scale_x: 2,
    scale_y: 2,
    bold: false,
};

impl GlyphStyle {
    pub fn advance(&self) -> u32 {
        GLYPH_CELL * self.scale_x
    }

    pub fn height(&self) -> u32 {
        GLYPH_CELL * self.scale_y
    }

    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.advance()
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode composite PNG: {0}")]
    Encode(#[source] image::ImageError),
    #[error("source image has no pixels")]
    EmptyImage,
}

/// Greedy word wrap of `caption` for a canvas `canvas_width` px wide.
///
/// A word moves to a new line when appending it (plus a trailing space) to a
/// non-empty line would exceed `canvas_width - SIDE_PADDING`. A single word
/// wider than that stays on its own line. Always returns at least one line.
pub fn wrap_caption(canvas_width: u32, caption: &str) -> Vec<String> {
    let max_width = canvas_width.saturating_sub(SIDE_PADDING);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in caption.split(' ') {
        let candidate = format!("{line}{word} ");
        if CAPTION_STYLE.text_width(&candidate) > max_width && !line.is_empty() {
            lines.push(line.trim_end().to_string());
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }
    lines.push(line.trim_end().to_string());
    lines
}

/// Positions of everything drawn on the composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLayout {
    pub width: u32,
    pub height: u32,
    pub image_height: u32,
    pub caption_lines: Vec<String>,
    pub first_baseline: u32,
    pub hashtag_baseline: u32,
}

impl CompositeLayout {
    pub fn new(width: u32, image_height: u32, caption: &str) -> Self {
        let caption_lines = wrap_caption(width, caption);
        let first_baseline = image_height + FIRST_BASELINE_OFFSET;
        let last_baseline = first_baseline + LINE_HEIGHT * (caption_lines.len() as u32 - 1);
        Self {
            width,
            height: image_height + FOOTER_HEIGHT,
            image_height,
            caption_lines,
            first_baseline,
            hashtag_baseline: last_baseline + HASHTAG_OFFSET,
        }
    }

    pub fn caption_baseline(&self, line: usize) -> u32 {
        self.first_baseline + LINE_HEIGHT * line as u32
    }
}

fn glyph_for(c: char) -> Option<[u8; 8]> {
    BASIC_FONTS.get(c).or_else(|| LATIN_FONTS.get(c))
}

fn put_clipped(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

fn draw_glyph(
    canvas: &mut RgbaImage,
    glyph: &[u8; 8],
    left: i64,
    top: i64,
    style: GlyphStyle,
    color: Rgba<u8>,
) {
    let stroke = style.scale_x + u32::from(style.bold);
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_CELL {
            if bits & (1 << col) == 0 {
                continue;
            }
            let x0 = left + i64::from(col * style.scale_x);
            let y0 = top + (row as i64) * i64::from(style.scale_y);
            for dy in 0..style.scale_y {
                for dx in 0..stroke {
                    put_clipped(canvas, x0 + i64::from(dx), y0 + i64::from(dy), color);
                }
            }
        }
    }
}

/// Draws `text` centred on `center_x` with its baseline at `baseline`.
fn draw_centered(
    canvas: &mut RgbaImage,
    text: &str,
    center_x: u32,
    baseline: u32,
    style: GlyphStyle,
    color: Rgba<u8>,
) {
    let width = i64::from(style.text_width(text));
    let mut left = i64::from(center_x) - width / 2;
    let top = i64::from(baseline) - i64::from(style.height());
    for c in text.chars() {
        if let Some(glyph) = glyph_for(c) {
            draw_glyph(canvas, &glyph, left, top, style, color);
        }
        left += i64::from(style.advance());
    }
}

fn shade_footer(canvas: &mut RgbaImage, from_y: u32) {
    let shade = Rgba([0, 0, 0, (FOOTER_OPACITY * 255.0).round() as u8]);
    for y in from_y..canvas.height() {
        for x in 0..canvas.width() {
            canvas.get_pixel_mut(x, y).blend(&shade);
        }
    }
}

/// Renders the composite and returns it as PNG bytes.
pub fn render(image_bytes: &[u8], caption: &str, hashtags: &[String]) -> Result<Vec<u8>, RenderError> {
    let base = image::load_from_memory(image_bytes)
        .map_err(RenderError::Decode)?
        .to_rgba8();
    let (width, image_height) = base.dimensions();
    if width == 0 || image_height == 0 {
        return Err(RenderError::EmptyImage);
    }

    let layout = CompositeLayout::new(width, image_height, caption);
    debug!(?layout, "[EXPORT] Composite layout computed");

    let mut canvas = RgbaImage::new(layout.width, layout.height);
    imageops::replace(&mut canvas, &base, 0, 0);
    shade_footer(&mut canvas, layout.image_height);

    let white = Rgba([255, 255, 255, 255]);
    let center_x = layout.width / 2;
    for (i, line) in layout.caption_lines.iter().enumerate() {
        draw_centered(&mut canvas, line, center_x, layout.caption_baseline(i), CAPTION_STYLE, white);
    }
    draw_centered(
        &mut canvas,
        &hashtags.join(" "),
        center_x,
        layout.hashtag_baseline,
        HASHTAG_STYLE,
        white,
    );

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut out, ImageFormat::Png)
        .map_err(RenderError::Encode)?;
    let png = out.into_inner();
    info!(
        width = layout.width,
        height = layout.height,
        caption_lines = layout.caption_lines.len(),
        bytes = png.len(),
        "[EXPORT] Rendered composite image"
    );
    Ok(png)
}
