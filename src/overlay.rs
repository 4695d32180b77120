//! Software flattening of annotations onto a page raster, used on save.
//!
//! Geometry is painted with `tiny-skia` in page space under a scale
//! transform. Glyphs come from `rusttype` using the same font files egui
//! ships with, so exported text looks like on-screen text.

use std::sync::OnceLock;

use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};
use rusttype::{Font, Scale, point};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};

use crate::document::Raster;
use crate::element::{
    ImageObject, ObjectKind, ObjectStyle, SceneObject, TEXT_LINE_HEIGHT, TEXT_PADDING, TextObject,
    arrow_head_points,
};
use crate::error::ExportError;
use crate::geometry::hit_testing::triangle_points;

fn proportional_font() -> Option<&'static Font<'static>> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| {
        let font = Font::try_from_bytes(epaint_default_fonts::UBUNTU_LIGHT);
        if font.is_none() {
            log::error!("Bundled font could not be parsed, text will be skipped on export");
        }
        font
    })
    .as_ref()
}

fn monospace_font() -> Option<&'static Font<'static>> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| Font::try_from_bytes(epaint_default_fonts::HACK_REGULAR))
        .as_ref()
}

/// Paint `objects` (bottom to top) over `raster` and return the result
pub fn flatten(raster: &Raster, objects: &[&SceneObject]) -> Result<RgbaImage, ExportError> {
    let [width, height] = raster.size.map(|v| v as u32);
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Surface { width, height })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(raster.rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }

    let scale = raster.scale();
    let transform = Transform::from_scale(scale, scale);
    for object in objects.iter().filter(|object| object.visible) {
        paint_object(&mut pixmap, object, transform, scale);
    }
    log::debug!("Flattened {} objects onto page {}", objects.len(), raster.page);

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let pixel = pixmap.pixels()[(y * width + x) as usize].demultiply();
        Rgba([pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()])
    }))
}

fn paint_for(color: Color32) -> Paint<'static> {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn stroke_for(style: &ObjectStyle) -> Stroke {
    Stroke {
        width: style.stroke_width.max(0.5),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

fn rect_path(rect: egui::Rect) -> Option<Path> {
    tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y).map(PathBuilder::from_rect)
}

fn polygon(points: &[Pos2], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

fn fill_and_stroke(pixmap: &mut Pixmap, path: Option<Path>, style: &ObjectStyle, transform: Transform) {
    let Some(path) = path else {
        return;
    };
    if let Some(fill) = style.fill {
        pixmap.fill_path(&path, &paint_for(style.faded(fill)), FillRule::Winding, transform, None);
    }
    if style.stroke_width > 0.0 {
        let paint = paint_for(style.faded(style.stroke_color));
        pixmap.stroke_path(&path, &paint, &stroke_for(style), transform, None);
    }
}

fn stroke_only(pixmap: &mut Pixmap, path: Option<Path>, style: &ObjectStyle, transform: Transform) {
    if let Some(path) = path {
        let paint = paint_for(style.faded(style.stroke_color));
        pixmap.stroke_path(&path, &paint, &stroke_for(style), transform, None);
    }
}

fn paint_object(pixmap: &mut Pixmap, object: &SceneObject, transform: Transform, scale: f32) {
    let style = &object.style;
    match &object.kind {
        ObjectKind::Rectangle { rect } => fill_and_stroke(pixmap, rect_path(*rect), style, transform),
        ObjectKind::Triangle { rect } => {
            fill_and_stroke(pixmap, polygon(&triangle_points(*rect), true), style, transform);
        }
        ObjectKind::Circle { center, radius } => {
            let path = PathBuilder::from_circle(center.x, center.y, *radius);
            fill_and_stroke(pixmap, path, style, transform);
        }
        ObjectKind::Ellipse { center, radii } => {
            let oval = tiny_skia::Rect::from_xywh(center.x - radii.x, center.y - radii.y, radii.x * 2.0, radii.y * 2.0);
            fill_and_stroke(pixmap, oval.and_then(PathBuilder::from_oval), style, transform);
        }
        ObjectKind::Line { start, end } => stroke_only(pixmap, polygon(&[*start, *end], false), style, transform),
        ObjectKind::Arrow { start, end } => {
            stroke_only(pixmap, polygon(&[*start, *end], false), style, transform);
            if let Some(head) = polygon(&arrow_head_points(*start, *end, style.stroke_width), true) {
                let paint = paint_for(style.faded(style.stroke_color));
                pixmap.fill_path(&head, &paint, FillRule::Winding, transform, None);
            }
        }
        ObjectKind::Freehand { points } => stroke_only(pixmap, polygon(points, false), style, transform),
        ObjectKind::Image(image) => paint_image(pixmap, image, style.opacity, transform),
        ObjectKind::Stamp { rect, label } => {
            stroke_only(pixmap, rect_path(*rect), style, transform);
            let font_size = rect.height() * 0.6;
            let text_width = measure(label, font_size, false);
            let origin = Pos2::new(
                rect.center().x - text_width / 2.0,
                rect.center().y - font_size * TEXT_LINE_HEIGHT / 2.0,
            );
            draw_text(pixmap, label, origin, font_size, false, style.faded(style.stroke_color), scale);
        }
        ObjectKind::Text(text) => paint_text(pixmap, text, style, transform, scale),
    }
}

fn paint_image(pixmap: &mut Pixmap, image: &ImageObject, opacity: f32, transform: Transform) {
    let [w, h] = image.size.map(|v| v as u32);
    let Some(mut source) = Pixmap::new(w, h) else {
        log::warn!("Skipping image with invalid size {}x{}", w, h);
        return;
    };
    for (dst, src) in source.pixels_mut().iter_mut().zip(image.rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    let placement = Transform::from_row(
        image.rect.width() / w as f32,
        0.0,
        0.0,
        image.rect.height() / h as f32,
        image.rect.min.x,
        image.rect.min.y,
    );
    let paint = PixmapPaint {
        opacity: opacity.clamp(0.0, 1.0),
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform.pre_concat(placement), None);
}

fn paint_text(pixmap: &mut Pixmap, text: &TextObject, style: &ObjectStyle, transform: Transform, scale: f32) {
    if let Some(background) = text.background {
        if let Some(path) = rect_path(text.rect()) {
            let paint = paint_for(style.faded(background));
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }
    }
    let monospace = text.font_family.eq_ignore_ascii_case("monospace");
    let origin = text.anchor + egui::vec2(TEXT_PADDING, TEXT_PADDING);
    let color = style.faded(text.color);
    for (line_index, line) in text.content.split('\n').enumerate() {
        let line_origin = origin + egui::vec2(0.0, line_index as f32 * text.font_size * TEXT_LINE_HEIGHT);
        draw_text(pixmap, line, line_origin, text.font_size, monospace, color, scale);
        if text.bold {
            let offset = egui::vec2((text.font_size * 0.04).max(0.5), 0.0);
            draw_text(pixmap, line, line_origin + offset, text.font_size, monospace, color, scale);
        }
    }
}

fn font(monospace: bool) -> Option<&'static Font<'static>> {
    if monospace { monospace_font() } else { proportional_font() }
}

/// Advance width of `text` in page units
fn measure(text: &str, font_size: f32, monospace: bool) -> f32 {
    let Some(font) = font(monospace) else {
        return 0.0;
    };
    let scale = Scale::uniform(font_size);
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map_or(0.0, |glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
}

/// Draw one line with its top-left at `origin` (page units)
fn draw_text(pixmap: &mut Pixmap, text: &str, origin: Pos2, font_size: f32, monospace: bool, color: Color32, scale: f32) {
    let Some(font) = font(monospace) else {
        return;
    };
    let px_scale = Scale::uniform(font_size * scale);
    let ascent = font.v_metrics(px_scale).ascent;
    let start = point(origin.x * scale, origin.y * scale + ascent);
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);

    for glyph in font.layout(text, px_scale, start) {
        let Some(bounds) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let x = gx as i32 + bounds.min.x;
            let y = gy as i32 + bounds.min.y;
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let alpha = coverage * f32::from(a) / 255.0;
            if alpha <= 0.0 {
                return;
            }
            let index = (y * width + x) as usize;
            let dst = pixmap.pixels()[index].demultiply();
            let mix = |s: u8, d: u8| (f32::from(s) * alpha + f32::from(d) * (1.0 - alpha)).round() as u8;
            let out_alpha = (alpha * 255.0 + f32::from(dst.alpha()) * (1.0 - alpha)).round() as u8;
            pixmap.pixels_mut()[index] =
                ColorU8::from_rgba(mix(r, dst.red()), mix(g, dst.green()), mix(b, dst.blue()), out_alpha).premultiply();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use egui::{Rect, pos2, vec2};

    fn white_page() -> Raster {
        Raster::blank(1, vec2(100.0, 100.0), 1.0, Color32::WHITE).unwrap()
    }

    fn pixel(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        image.get_pixel(x, y).0
    }

    #[test]
    fn filled_rectangle_is_painted() {
        let style = ObjectStyle {
            fill: Some(Color32::BLUE),
            stroke_width: 0.0,
            ..Default::default()
        };
        let rect = factory::rectangle(1, Rect::from_min_size(pos2(10.0, 10.0), vec2(20.0, 20.0)), style);
        let image = flatten(&white_page(), &[&rect]).unwrap();
        assert_eq!(pixel(&image, 20, 20), [0, 0, 255, 255]);
        assert_eq!(pixel(&image, 50, 50), [255, 255, 255, 255]);
    }

    #[test]
    fn hidden_objects_are_skipped() {
        let style = ObjectStyle {
            fill: Some(Color32::BLACK),
            ..Default::default()
        };
        let mut rect = factory::rectangle(1, Rect::from_min_size(pos2(0.0, 0.0), vec2(50.0, 50.0)), style);
        rect.visible = false;
        let image = flatten(&white_page(), &[&rect]).unwrap();
        assert_eq!(pixel(&image, 25, 25), [255, 255, 255, 255]);
    }

    #[test]
    fn text_darkens_some_pixels() {
        let text = factory::text(1, pos2(5.0, 5.0), "Hello", Color32::BLACK);
        let image = flatten(&white_page(), &[&text]).unwrap();
        let inked = image.pixels().filter(|p| p.0[0] < 128).count();
        assert!(inked > 0);
    }
}
