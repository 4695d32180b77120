use egui::{Pos2, Rect, Vec2};

// Common constants for all element types
pub const MIN_ELEMENT_SIZE: f32 = 2.0;
/// Advance of one glyph relative to the font size, used for text bounds
pub const TEXT_ADVANCE: f32 = 0.55;
pub const TEXT_LINE_HEIGHT: f32 = 1.25;
pub const TEXT_PADDING: f32 = 2.0;
/// Length of an arrow head relative to the stroke width
pub const ARROW_HEAD_SCALE: f32 = 4.0;
pub const MIN_ARROW_HEAD: f32 = 8.0;

/// Validates that a rectangle has minimum dimensions
pub(crate) fn validate_rect(rect: &Rect) -> Result<(), String> {
    if rect.width() < MIN_ELEMENT_SIZE || rect.height() < MIN_ELEMENT_SIZE {
        Err(format!(
            "Element dimensions too small (min: {}). Width: {}, Height: {}",
            MIN_ELEMENT_SIZE,
            rect.width(),
            rect.height()
        ))
    } else {
        Ok(())
    }
}

/// Like [`validate_rect`] but only the longer side has to reach the minimum
pub(crate) fn validate_extent(rect: &Rect) -> Result<(), String> {
    if rect.width().max(rect.height()) < MIN_ELEMENT_SIZE {
        Err(format!(
            "Path extent too small (min: {}). Width: {}, Height: {}",
            MIN_ELEMENT_SIZE,
            rect.width(),
            rect.height()
        ))
    } else {
        Ok(())
    }
}

/// Approximate text box size without a font system
pub(crate) fn text_box_size(content: &str, font_size: f32) -> Vec2 {
    let lines = content.split('\n').count().max(1) as f32;
    let widest = content
        .split('\n')
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .max(1) as f32;
    Vec2::new(
        widest * font_size * TEXT_ADVANCE + TEXT_PADDING * 2.0,
        lines * font_size * TEXT_LINE_HEIGHT + TEXT_PADDING * 2.0,
    )
}

/// The three points of an arrow head at `end`
pub fn arrow_head_points(start: Pos2, end: Pos2, stroke_width: f32) -> [Pos2; 3] {
    let dir = (end - start).normalized();
    let len = (stroke_width * ARROW_HEAD_SCALE).max(MIN_ARROW_HEAD);
    let back = end - dir * len;
    let normal = dir.rot90() * (len * 0.5);
    [end, back + normal, back - normal]
}

/// Map `p` from `from` into `to`, preserving its relative position
pub(crate) fn remap(p: Pos2, from: Rect, to: Rect) -> Pos2 {
    let rel_x = if from.width() > 0.0 { (p.x - from.min.x) / from.width() } else { 0.0 };
    let rel_y = if from.height() > 0.0 { (p.y - from.min.y) / from.height() } else { 0.0 };
    Pos2::new(to.min.x + rel_x * to.width(), to.min.y + rel_y * to.height())
}
