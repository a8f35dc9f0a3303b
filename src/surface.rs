//! Drawing backends.
//!
//! Painters speak millimetres through [`Surface`]; each backend decides how
//! to turn them into output. [`PixelCanvas`] rasterises into an RGB buffer
//! with the bitmap font and saves PNG, [`SvgCanvas`] emits vector markup,
//! and [`RecordingSurface`] keeps the calls for inspection.

use std::path::Path;

use log::info;

use crate::color::Rgb;
use crate::error::{HeatmapError, Result};
use crate::font::{layout_glyphs, ADVANCE};
use crate::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// A single line of text.
///
/// Horizontal text is centred vertically on `y` and anchored on `x`.
/// Vertical text reads bottom to top, is centred horizontally on `x` and
/// anchored on `y` (`Start` is its lower end).
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Glyph box height in millimetres
    pub size: f64,
    pub color: Rgb,
    pub anchor: Anchor,
    pub vertical: bool,
    /// Truncate longer text, marking the cut
    pub max_chars: Option<usize>,
}

impl TextSpec {
    pub fn new(text: impl Into<String>, x: f64, y: f64, size: f64) -> Self {
        TextSpec {
            text: text.into(),
            x,
            y,
            size,
            color: Rgb::BLACK,
            anchor: Anchor::Start,
            vertical: false,
            max_chars: None,
        }
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }

    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    /// Text after truncation, as drawn
    pub fn visible_text(&self) -> String {
        match self.max_chars {
            Some(limit) if self.text.chars().count() > limit => {
                let mut cut: String = self.text.chars().take(limit.saturating_sub(1)).collect();
                if limit > 0 {
                    cut.push_str("...");
                }
                cut
            }
            _ => self.text.clone(),
        }
    }
}

/// Drawing target for a composed figure. Coordinates are millimetres from the
/// top-left corner.
pub trait Surface {
    /// Start a figure of the given size; clears anything drawn before.
    fn begin(&mut self, width_mm: f64, height_mm: f64);
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb, width_mm: f64);
    fn text(&mut self, spec: &TextSpec);
}

/// RGB raster with a fixed resolution.
pub struct PixelCanvas {
    px_per_mm: f64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelCanvas {
    pub fn new(dpi: f64) -> Self {
        PixelCanvas {
            px_per_mm: dpi / 25.4,
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        Some(Rgb(self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]))
    }

    /// Byte offset of a pixel, computed in `usize`
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    /// Pixel edge nearest to a millimetre coordinate. Shared panel edges
    /// round to the same pixel.
    fn px(&self, mm: f64) -> i64 {
        (mm * self.px_per_mm).round() as i64
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = self.index(x as u32, y as u32);
        self.pixels[idx] = color.0;
        self.pixels[idx + 1] = color.1;
        self.pixels[idx + 2] = color.2;
    }

    fn fill_px(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb) {
        for y in y0.max(0)..y1.min(self.height as i64) {
            for x in x0.max(0)..x1.min(self.width as i64) {
                self.put(x, y, color);
            }
        }
    }

    fn write_glyph(&mut self, origin: (i64, i64), glyph: &[u8; 8], ratio: i64, vertical: bool, color: Rgb) {
        for j in 0..8i64 {
            let row = glyph[j as usize];
            for z in (0..8i64).rev() {
                if (row >> z) & 1 == 1 {
                    let col = 7 - z;
                    // vertical glyphs are turned a quarter counter-clockwise
                    let (x, y) = if vertical {
                        (origin.0 + j * ratio, origin.1 - (col + 1) * ratio)
                    } else {
                        (origin.0 + col * ratio, origin.1 + j * ratio)
                    };
                    self.fill_px(x, y, x + ratio, y + ratio, color);
                }
            }
        }
    }

    pub fn to_image(&self) -> Result<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(|| {
            HeatmapError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "pixel buffer does not match canvas size",
            ))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving {}x{} image to {:?}", self.width, self.height, path);
        self.to_image()?.save(path)?;
        Ok(())
    }
}

impl Surface for PixelCanvas {
    fn begin(&mut self, width_mm: f64, height_mm: f64) {
        self.width = (width_mm * self.px_per_mm).ceil().max(1.0) as u32;
        self.height = (height_mm * self.px_per_mm).ceil().max(1.0) as u32;
        self.pixels = vec![255; self.width as usize * self.height as usize * 3];
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let (x0, y0) = (self.px(rect.x0), self.px(rect.y0));
        // thin cells still get one pixel
        let x1 = self.px(rect.x1).max(x0 + 1);
        let y1 = self.px(rect.y1).max(y0 + 1);
        self.fill_px(x0, y0, x1, y1, color);
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb, width_mm: f64) {
        let brush = ((width_mm * self.px_per_mm).round() as i64).max(1);
        let half = brush / 2;
        for pair in points.windows(2) {
            let (ax, ay) = (pair[0].0 * self.px_per_mm, pair[0].1 * self.px_per_mm);
            let (bx, by) = (pair[1].0 * self.px_per_mm, pair[1].1 * self.px_per_mm);
            let steps = (bx - ax).abs().max((by - ay).abs()).ceil().max(1.0) as i64;
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                let x = (ax + (bx - ax) * t).round() as i64 - half;
                let y = (ay + (by - ay) * t).round() as i64 - half;
                self.fill_px(x, y, x + brush, y + brush, color);
            }
        }
    }

    fn text(&mut self, spec: &TextSpec) {
        let glyphs = layout_glyphs(&spec.text, spec.max_chars);
        let ratio = ((spec.size * self.px_per_mm / 8.0).round() as i64).max(1);
        let advance = ADVANCE as i64 * ratio;
        let length = glyphs.len() as i64 * advance;
        let offset = match spec.anchor {
            Anchor::Start => 0,
            Anchor::Middle => length / 2,
            Anchor::End => length,
        };

        if spec.vertical {
            let x = self.px(spec.x) - 4 * ratio;
            let mut y = self.px(spec.y) + offset;
            for glyph in glyphs {
                self.write_glyph((x, y), glyph, ratio, true, spec.color);
                y -= advance;
            }
        } else {
            let mut x = self.px(spec.x) - offset;
            let y = self.px(spec.y) - 4 * ratio;
            for glyph in glyphs {
                self.write_glyph((x, y), glyph, ratio, false, spec.color);
                x += advance;
            }
        }
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rgb(color: Rgb) -> String {
    format!("rgb({},{},{})", color.0, color.1, color.2)
}

/// SVG document in millimetre user units.
#[derive(Default)]
pub struct SvgCanvas {
    svg: String,
}

impl SvgCanvas {
    pub fn new() -> Self {
        SvgCanvas::default()
    }

    /// Close the document and return its markup.
    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>\n");
        self.svg
    }

    pub fn save(self, path: &Path) -> Result<()> {
        info!("Saving SVG to {:?}", path);
        std::fs::write(path, self.finish())?;
        Ok(())
    }
}

impl Surface for SvgCanvas {
    fn begin(&mut self, width_mm: f64, height_mm: f64) {
        self.svg.clear();
        self.svg.push_str(&format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}">
<style>
  .label {{ font-family: 'DejaVu Sans Mono', 'Courier New', monospace; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
            w = width_mm,
            h = height_mm
        ));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.svg.push_str(&format!(
            r#"<rect x="{:.4}" y="{:.4}" width="{:.4}" height="{:.4}" fill="{}"/>"#,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
            rgb(color)
        ));
        self.svg.push('\n');
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb, width_mm: f64) {
        let coords: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.4},{:.4}", x, y))
            .collect();
        self.svg.push_str(&format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.4}"/>"#,
            coords.join(" "),
            rgb(color),
            width_mm
        ));
        self.svg.push('\n');
    }

    fn text(&mut self, spec: &TextSpec) {
        let anchor = match spec.anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let rotate = if spec.vertical {
            format!(r#" transform="rotate(-90 {:.4} {:.4})""#, spec.x, spec.y)
        } else {
            String::new()
        };
        self.svg.push_str(&format!(
            r#"<text x="{:.4}" y="{:.4}" class="label" font-size="{:.4}" text-anchor="{}" dominant-baseline="central" fill="{}"{}>{}</text>"#,
            spec.x,
            spec.y,
            spec.size,
            anchor,
            rgb(spec.color),
            rotate,
            escape_xml(&spec.visible_text())
        ));
        self.svg.push('\n');
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Begin { width: f64, height: f64 },
    Rect { rect: Rect, color: Rgb },
    Polyline { points: Vec<(f64, f64)>, color: Rgb, width: f64 },
    Text(TextSpec),
}

/// Keeps every call instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        RecordingSurface::default()
    }

    pub fn rects(&self) -> impl Iterator<Item = (&Rect, &Rgb)> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Rect { rect, color } => Some((rect, color)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextSpec> {
        self.calls.iter().filter_map(|c| match c {
            DrawCall::Text(spec) => Some(spec),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn begin(&mut self, width_mm: f64, height_mm: f64) {
        self.calls.clear();
        self.calls.push(DrawCall::Begin {
            width: width_mm,
            height: height_mm,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.calls.push(DrawCall::Rect { rect, color });
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb, width_mm: f64) {
        self.calls.push(DrawCall::Polyline {
            points: points.to_vec(),
            color,
            width: width_mm,
        });
    }

    fn text(&mut self, spec: &TextSpec) {
        self.calls.push(DrawCall::Text(spec.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_canvas_fills_rounded_rects() {
        // 25.4 dpi is one pixel per millimetre
        let mut canvas = PixelCanvas::new(25.4);
        canvas.begin(10.0, 5.0);
        assert_eq!(canvas.dimensions(), (10, 5));
        canvas.fill_rect(Rect::new(2.0, 1.0, 4.0, 3.0), Rgb(200, 0, 0));
        assert_eq!(canvas.pixel(2, 1), Some(Rgb(200, 0, 0)));
        assert_eq!(canvas.pixel(3, 2), Some(Rgb(200, 0, 0)));
        assert_eq!(canvas.pixel(4, 1), Some(Rgb::WHITE));
        assert_eq!(canvas.pixel(10, 0), None);
    }

    #[test]
    fn pixel_offsets_do_not_wrap_on_large_canvases() {
        let canvas = PixelCanvas {
            px_per_mm: 1.0,
            width: 70_000,
            height: 70_000,
            pixels: Vec::new(),
        };
        assert_eq!(canvas.index(69_999, 69_999), 14_699_999_997);
        assert_eq!(canvas.pixel(70_000, 0), None);
    }

    #[test]
    fn pixel_canvas_draws_lines_and_text() {
        let mut canvas = PixelCanvas::new(25.4);
        canvas.begin(40.0, 20.0);
        canvas.polyline(&[(1.0, 1.0), (1.0, 10.0), (8.0, 10.0)], Rgb::BLACK, 0.5);
        assert_eq!(canvas.pixel(1, 5), Some(Rgb::BLACK));
        assert_eq!(canvas.pixel(5, 10), Some(Rgb::BLACK));

        canvas.text(&TextSpec::new("I", 20.0, 15.0, 8.0));
        // the 'I' glyph has its full top bar on font row 0
        let lit = (20..26).any(|x| canvas.pixel(x, 11) == Some(Rgb::BLACK));
        assert!(lit);
        assert!(canvas.to_image().is_ok());
    }

    #[test]
    fn svg_escapes_and_rotates_text() {
        let mut svg = SvgCanvas::new();
        svg.begin(100.0, 50.0);
        svg.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgb(1, 2, 3));
        svg.text(&TextSpec::new("a<b", 5.0, 5.0, 2.0).vertical().anchor(Anchor::End));
        let out = svg.finish();
        assert!(out.contains(r#"width="100mm""#));
        assert!(out.contains("fill=\"rgb(1,2,3)\""));
        assert!(out.contains("a&lt;b"));
        assert!(out.contains("rotate(-90"));
        assert!(out.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn truncated_text_is_marked() {
        let spec = TextSpec::new("abcdefgh", 0.0, 0.0, 2.0).max_chars(4);
        assert_eq!(spec.visible_text(), "abc...");
    }

    #[test]
    fn begin_resets_the_recording() {
        let mut rec = RecordingSurface::new();
        rec.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgb::BLACK);
        rec.begin(1.0, 1.0);
        assert_eq!(rec.calls, vec![DrawCall::Begin { width: 1.0, height: 1.0 }]);
    }
}
