//! Drag geometry: turns a (start, current) pointer pair into shape extents,
//! applying square constraints and page-bound clamping.

use egui::{CursorIcon, Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

/// Clamp a point into `bounds`
pub fn clamp_to(bounds: Rect, p: Pos2) -> Pos2 {
    pos2(
        p.x.clamp(bounds.min.x, bounds.max.x),
        p.y.clamp(bounds.min.y, bounds.max.y),
    )
}

fn direction(delta: f32) -> f32 {
    if delta < 0.0 { -1.0 } else { 1.0 }
}

/// Room available from `start` towards the drag direction on each axis
fn room(bounds: Rect, start: Pos2, dir: Vec2) -> Vec2 {
    vec2(
        if dir.x < 0.0 { start.x - bounds.min.x } else { bounds.max.x - start.x },
        if dir.y < 0.0 { start.y - bounds.min.y } else { bounds.max.y - start.y },
    )
}

/// Rectangle spanning `start`↔`current`, independent of drag direction.
///
/// With `square` the side is `max(|dx|, |dy|)` and `start` stays the fixed
/// corner. If the square would leave `bounds`, the side shrinks on both axes
/// so the constraint still holds.
pub fn drag_rect(start: Pos2, current: Pos2, square: bool, bounds: Rect) -> Rect {
    let start = clamp_to(bounds, start);
    let current = clamp_to(bounds, current);
    if !square {
        return Rect::from_two_pos(start, current);
    }

    let delta = current - start;
    let dir = vec2(direction(delta.x), direction(delta.y));
    let room = room(bounds, start, dir);
    let side = delta.x.abs().max(delta.y.abs()).min(room.x).min(room.y);
    Rect::from_two_pos(start, start + vec2(dir.x * side, dir.y * side))
}

/// Circle whose diameter is the drag segment: `(center, radius)`
pub fn drag_circle(start: Pos2, current: Pos2, bounds: Rect) -> (Pos2, f32) {
    let start = clamp_to(bounds, start);
    let current = clamp_to(bounds, current);
    let center = start.lerp(current, 0.5);
    let radius = start.distance(current) / 2.0;
    let max_radius = (center.x - bounds.min.x)
        .min(bounds.max.x - center.x)
        .min(center.y - bounds.min.y)
        .min(bounds.max.y - center.y)
        .max(0.0);
    (center, radius.min(max_radius))
}

/// Ellipse inscribed in the drag rectangle: `(center, radii)`
pub fn drag_ellipse(start: Pos2, current: Pos2, square: bool, bounds: Rect) -> (Pos2, Vec2) {
    let rect = drag_rect(start, current, square, bounds);
    (rect.center(), rect.size() / 2.0)
}

/// Line from a fixed start to the clamped current point
pub fn drag_line(start: Pos2, current: Pos2, bounds: Rect) -> (Pos2, Pos2) {
    (clamp_to(bounds, start), clamp_to(bounds, current))
}

/// Nearest grid intersection; `spacing <= 0` disables snapping
pub fn snap_to_grid(p: Pos2, spacing: f32) -> Pos2 {
    if spacing <= 0.0 {
        return p;
    }
    pos2((p.x / spacing).round() * spacing, (p.y / spacing).round() * spacing)
}

/// A corner of a selection box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn position(self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    pub fn cursor_icon(self) -> CursorIcon {
        match self {
            Corner::TopLeft | Corner::BottomRight => CursorIcon::ResizeNwSe,
            Corner::TopRight | Corner::BottomLeft => CursorIcon::ResizeNeSw,
        }
    }

    /// Corner of `rect` whose handle is within `radius` of `pos`
    pub fn hit(rect: Rect, pos: Pos2, radius: f32) -> Option<Corner> {
        Self::ALL
            .into_iter()
            .find(|corner| corner.position(rect).distance(pos) <= radius)
    }
}

/// New rect after dragging `corner` of `original` to `pos`; the opposite
/// corner stays fixed. Keeps the aspect ratio when `keep_aspect` is set.
pub fn resize_rect(original: Rect, corner: Corner, pos: Pos2, keep_aspect: bool, bounds: Rect) -> Rect {
    let anchor = corner.opposite().position(original);
    let pos = clamp_to(bounds, pos);
    if !keep_aspect || original.height() <= 0.0 {
        return Rect::from_two_pos(anchor, pos);
    }
    let aspect = original.width() / original.height();
    let delta = pos - anchor;
    let dir = vec2(direction(delta.x), direction(delta.y));
    let room = room(bounds, anchor, dir);
    let mut width = delta.x.abs().max(delta.y.abs() * aspect).min(room.x);
    let mut height = width / aspect;
    if height > room.y {
        height = room.y;
        width = height * aspect;
    }
    Rect::from_two_pos(anchor, anchor + vec2(dir.x * width, dir.y * height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Rect {
        Rect::from_min_max(Pos2::ZERO, pos2(600.0, 800.0))
    }

    #[test]
    fn rect_is_direction_independent() {
        let forward = drag_rect(pos2(10.0, 10.0), pos2(110.0, 60.0), false, page());
        let backward = drag_rect(pos2(110.0, 60.0), pos2(10.0, 10.0), false, page());
        assert_eq!(forward, backward);
        assert_eq!(forward.min, pos2(10.0, 10.0));
        assert_eq!(forward.size(), vec2(100.0, 50.0));
    }

    #[test]
    fn square_keeps_start_corner() {
        let r = drag_rect(pos2(0.0, 0.0), pos2(30.0, 80.0), true, page());
        assert_eq!(r, Rect::from_min_max(pos2(0.0, 0.0), pos2(80.0, 80.0)));

        let up_left = drag_rect(pos2(100.0, 100.0), pos2(90.0, 40.0), true, page());
        assert_eq!(up_left, Rect::from_min_max(pos2(40.0, 40.0), pos2(100.0, 100.0)));
    }

    #[test]
    fn square_shrinks_when_clamped() {
        // Only 20 units of room on x; the square must stay square.
        let r = drag_rect(pos2(580.0, 100.0), pos2(700.0, 200.0), true, page());
        assert_eq!(r.width(), r.height());
        assert_eq!(r.width(), 20.0);
    }

    #[test]
    fn circle_stays_on_page() {
        let (center, radius) = drag_circle(pos2(0.0, 0.0), pos2(40.0, 0.0), page());
        assert_eq!(center, pos2(20.0, 0.0));
        assert_eq!(radius, 0.0);

        let (center, radius) = drag_circle(pos2(100.0, 100.0), pos2(160.0, 180.0), page());
        assert_eq!(center, pos2(130.0, 140.0));
        assert!((radius - 50.0).abs() < 1e-4);
    }

    #[test]
    fn ellipse_radii_are_half_extent() {
        let (center, radii) = drag_ellipse(pos2(10.0, 10.0), pos2(50.0, 30.0), false, page());
        assert_eq!(center, pos2(30.0, 20.0));
        assert_eq!(radii, vec2(20.0, 10.0));
    }

    #[test]
    fn snapping_rounds_to_nearest_line() {
        assert_eq!(snap_to_grid(pos2(14.0, 16.0), 10.0), pos2(10.0, 20.0));
        assert_eq!(snap_to_grid(pos2(14.0, 16.0), 0.0), pos2(14.0, 16.0));
    }

    #[test]
    fn resize_keeps_opposite_corner() {
        let original = Rect::from_min_max(pos2(10.0, 10.0), pos2(50.0, 30.0));
        let r = resize_rect(original, Corner::BottomRight, pos2(90.0, 70.0), false, page());
        assert_eq!(r.min, pos2(10.0, 10.0));
        assert_eq!(r.max, pos2(90.0, 70.0));

        let aspect = resize_rect(original, Corner::BottomRight, pos2(90.0, 20.0), true, page());
        assert!((aspect.width() / aspect.height() - 2.0).abs() < 1e-4);
    }
}
