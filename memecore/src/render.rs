//! Rasterize a composition onto its background
//!
//! The output is sized to the background's native pixels. Each text layer is
//! laid out on one line, centered horizontally on its `x` with `y` as the
//! baseline, stroked in black (width = font size / 16, centered on the glyph
//! edge) and then filled in white, in layer order.

use ab_glyph::{Font, FontArc, GlyphId, Outline, OutlineCurve, Point};
use image::{DynamicImage, Rgba, RgbaImage};
use tiny_skia::{FillRule, IntSize, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::composition::Composition;
use crate::error::ExportError;

pub const TEXT_FILL: [u8; 4] = [255, 255, 255, 255];
pub const TEXT_OUTLINE: [u8; 4] = [0, 0, 0, 255];

/// Outline width for a given font size.
pub fn outline_width(font_size: f32) -> f32 {
    font_size / 16.0
}

pub fn render_composition(
    comp: &Composition,
    background: &DynamicImage,
    font: &FontArc,
) -> Result<RgbaImage, ExportError> {
    let mut pixmap = pixmap_from_image(&background.to_rgba8())?;

    let mut fill = Paint::default();
    fill.set_color_rgba8(TEXT_FILL[0], TEXT_FILL[1], TEXT_FILL[2], TEXT_FILL[3]);
    fill.anti_alias = true;
    let mut outline = Paint::default();
    outline.set_color_rgba8(TEXT_OUTLINE[0], TEXT_OUTLINE[1], TEXT_OUTLINE[2], TEXT_OUTLINE[3]);
    outline.anti_alias = true;
    let stroke = Stroke {
        width: outline_width(comp.font_size),
        line_join: LineJoin::Miter,
        miter_limit: 10.0,
        ..Stroke::default()
    };

    for layer in &comp.layers {
        let Some(path) = text_path(font, &layer.text, comp.font_size, layer.x, layer.y) else {
            continue;
        };
        pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
        pixmap.fill_path(&path, &fill, FillRule::Winding, Transform::identity(), None);
    }

    Ok(image_from_pixmap(&pixmap))
}

/// Horizontal advance of `text` at `size` px.
pub fn text_width(font: &FontArc, text: &str, size: f32) -> f32 {
    let scale = em_scale(font, size);
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = font.glyph_id(c);
        if let Some(p) = prev {
            width += font.kern_unscaled(p, id) * scale;
        }
        width += font.h_advance_unscaled(id) * scale;
        prev = Some(id);
    }
    width
}

// Font sizes are em sizes, not ascent-to-descent heights
fn em_scale(font: &FontArc, size: f32) -> f32 {
    let upem = font.units_per_em().unwrap_or_else(|| font.height_unscaled());
    size / upem
}

fn text_path(font: &FontArc, text: &str, size: f32, center_x: f32, baseline: f32) -> Option<Path> {
    let scale = em_scale(font, size);
    let mut pen = center_x - text_width(font, text, size) / 2.0;
    let mut pb = PathBuilder::new();
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let id = font.glyph_id(c);
        if let Some(p) = prev {
            pen += font.kern_unscaled(p, id) * scale;
        }
        if let Some(outline) = font.outline(id) {
            append_outline(&mut pb, &outline, pen, baseline, scale);
        }
        pen += font.h_advance_unscaled(id) * scale;
        prev = Some(id);
    }
    pb.finish()
}

fn append_outline(pb: &mut PathBuilder, outline: &Outline, origin_x: f32, baseline: f32, scale: f32) {
    // font units are y-up
    let map = |p: Point| (origin_x + p.x * scale, baseline - p.y * scale);
    let mut last: Option<Point> = None;
    for curve in &outline.curves {
        let (start, end) = match curve {
            OutlineCurve::Line(a, b) => (*a, *b),
            OutlineCurve::Quad(a, _, c) => (*a, *c),
            OutlineCurve::Cubic(a, _, _, d) => (*a, *d),
        };
        // A curve not starting where the previous ended opens a new contour
        if !last.is_some_and(|l| same_point(l, start)) {
            if last.is_some() {
                pb.close();
            }
            let (x, y) = map(start);
            pb.move_to(x, y);
        }
        match curve {
            OutlineCurve::Line(_, b) => {
                let (x, y) = map(*b);
                pb.line_to(x, y);
            }
            OutlineCurve::Quad(_, c1, b) => {
                let (cx, cy) = map(*c1);
                let (x, y) = map(*b);
                pb.quad_to(cx, cy, x, y);
            }
            OutlineCurve::Cubic(_, c1, c2, b) => {
                let (c1x, c1y) = map(*c1);
                let (c2x, c2y) = map(*c2);
                let (x, y) = map(*b);
                pb.cubic_to(c1x, c1y, c2x, c2y, x, y);
            }
        }
        last = Some(end);
    }
    if last.is_some() {
        pb.close();
    }
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

fn pixmap_from_image(img: &RgbaImage) -> Result<Pixmap, ExportError> {
    let (w, h) = img.dimensions();
    let size = IntSize::from_wh(w, h).ok_or(ExportError::Surface(w, h))?;
    let mut data = Vec::with_capacity(img.as_raw().len());
    for p in img.pixels() {
        let [r, g, b, a] = p.0;
        data.extend_from_slice(&[premultiply(r, a), premultiply(g, a), premultiply(b, a), a]);
    }
    Pixmap::from_vec(data, size).ok_or(ExportError::Surface(w, h))
}

fn premultiply(c: u8, a: u8) -> u8 {
    ((u16::from(c) * u16::from(a) + 127) / 255) as u8
}

fn image_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Upload-ready copy for egui textures.
pub fn color_image(img: &RgbaImage) -> egui::ColorImage {
    let (w, h) = img.dimensions();
    egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], img.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{IdGenerator, TextLayer};
    use crate::font::bundled_font;
    use crate::source::ImageSource;

    fn gray(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255])))
    }

    fn comp_with(text: &str, x: f32, y: f32, size: f32) -> Composition {
        let mut ids = IdGenerator::new();
        Composition {
            background: ImageSource::url("file:///unused.png"),
            layers: vec![TextLayer { id: ids.next_id(), text: text.into(), x, y }],
            font_size: size,
        }
    }

    #[test]
    fn test_outline_width_scales() {
        assert_eq!(outline_width(32.0), 2.0);
        assert_eq!(outline_width(16.0), 1.0);
    }

    #[test]
    fn test_no_layers_copies_background() {
        let font = bundled_font().unwrap();
        let bg = gray(20, 10);
        let mut comp = comp_with("x", 0.0, 0.0, 32.0);
        comp.layers.clear();
        let out = render_composition(&comp, &bg, &font).unwrap();
        assert_eq!(out, bg.to_rgba8());
    }

    #[test]
    fn test_text_centered_on_x() {
        let font = bundled_font().unwrap();
        let out = render_composition(&comp_with("HHHH", 100.0, 60.0, 32.0), &gray(200, 100), &font).unwrap();
        // changed columns straddle x = 100 evenly (within a pixel or two of AA)
        let changed: Vec<u32> = (0..200)
            .filter(|&x| (0..100).any(|y| out.get_pixel(x, y).0[0] != 128))
            .collect();
        let (first, last) = (changed[0], *changed.last().unwrap());
        let left = 100 - first as i32;
        let right = last as i32 - 100;
        assert!((left - right).abs() <= 3, "left {} right {}", left, right);
    }

    #[test]
    fn test_text_sits_on_baseline() {
        let font = bundled_font().unwrap();
        let out = render_composition(&comp_with("HHHH", 100.0, 60.0, 32.0), &gray(200, 100), &font).unwrap();
        // 'H' has no descender; only the outline may poke a pixel or two below
        for y in 63..100 {
            for x in 0..200 {
                assert_eq!(out.get_pixel(x, y).0, [128, 128, 128, 255], "ink at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_blank_text_draws_nothing() {
        let font = bundled_font().unwrap();
        let bg = gray(50, 50);
        let out = render_composition(&comp_with("   ", 25.0, 25.0, 32.0), &bg, &font).unwrap();
        assert_eq!(out, bg.to_rgba8());
    }

    #[test]
    fn test_transparent_background_preserved() {
        let font = bundled_font().unwrap();
        let bg = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0])));
        let mut comp = comp_with("x", 0.0, 0.0, 32.0);
        comp.layers.clear();
        let out = render_composition(&comp, &bg, &font).unwrap();
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }
}
