//! Panel layout for composite and synchronized frames.
//!
//! Panels are placed left to right with a black gutter between them. A
//! caption band on top holds one upper-case caption per panel, drawn with a
//! small built-in pixel font.

use crate::slice::Slice;

use image::{GrayImage, Luma, imageops};

const GUTTER: u32 = 4;
const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const GLYPH_SCALE: u32 = 2;
const CAPTION_PADDING: u32 = 3;
const CAPTION_BAND: u32 = GLYPH_HEIGHT * GLYPH_SCALE + 2 * CAPTION_PADDING;
const INK: Luma<u8> = Luma([255]);

/// One rendered slice plus the caption printed above it.
pub struct Panel {
    pub image: GrayImage,
    pub caption: String,
}

impl Panel {
    pub fn from_slice(slice: &Slice<'_>, caption: impl Into<String>) -> Self {
        Self {
            image: slice.to_image(),
            caption: caption.into(),
        }
    }
}

/// Lay out `panels` side by side under a caption band.
pub fn compose_panels(panels: &[Panel]) -> GrayImage {
    let width = panels.iter().map(|p| p.image.width()).sum::<u32>()
        + GUTTER * (panels.len().saturating_sub(1) as u32);
    let height = panels.iter().map(|p| p.image.height()).max().unwrap_or(0) + CAPTION_BAND;
    let mut canvas = GrayImage::new(width.max(1), height);

    let mut x = 0u32;
    for panel in panels {
        draw_text(
            &mut canvas,
            &panel.caption,
            x + CAPTION_PADDING,
            CAPTION_PADDING,
            x + panel.image.width(),
        );
        imageops::replace(&mut canvas, &panel.image, x as i64, CAPTION_BAND as i64);
        x += panel.image.width() + GUTTER;
    }
    canvas
}

/// Draw `text` starting at `(x, y)`; glyphs crossing column `right` are dropped.
fn draw_text(canvas: &mut GrayImage, text: &str, x: u32, y: u32, right: u32) {
    let advance = (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    let limit = right.min(canvas.width());
    for (n, ch) in text.chars().enumerate() {
        let origin = x + n as u32 * advance;
        if origin + GLYPH_WIDTH * GLYPH_SCALE > limit {
            break;
        }
        let rows = glyph(ch.to_ascii_uppercase());
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let px = origin + col * GLYPH_SCALE + dx;
                        let py = y + row as u32 * GLYPH_SCALE + dy;
                        if px < canvas.width() && py < canvas.height() {
                            canvas.put_pixel(px, py, INK);
                        }
                    }
                }
            }
        }
    }
}

/// 3x5 bitmap, one row per entry, most significant bit on the left.
fn glyph(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'N' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        _ => [0; 5],
    }
}
