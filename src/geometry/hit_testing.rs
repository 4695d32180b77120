use egui::{Pos2, Rect};

/// Extra slack around thin shapes so they can still be clicked
pub const HIT_SLOP: f32 = 4.0;

/// Distance from a point to a line segment
pub fn distance_to_line_segment(point: Pos2, line_start: Pos2, line_end: Pos2) -> f32 {
    let line_vec = line_end - line_start;
    let point_vec = point - line_start;

    let len_sq = line_vec.length_sq();
    if len_sq == 0.0 {
        return point_vec.length();
    }

    let t = ((point_vec.x * line_vec.x + point_vec.y * line_vec.y) / len_sq).clamp(0.0, 1.0);
    let projection = line_start + line_vec * t;
    (point - projection).length()
}

/// Bounding box for a set of points, grown by `padding`
pub fn calculate_bounds(points: &[Pos2], padding: f32) -> Rect {
    if points.is_empty() {
        return Rect::NOTHING;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Rect::from_min_max(
        Pos2::new(min_x - padding, min_y - padding),
        Pos2::new(max_x + padding, max_y + padding),
    )
}

/// Whether `pos` is within `tolerance` of any segment of the polyline
pub fn hits_polyline(points: &[Pos2], pos: Pos2, tolerance: f32) -> bool {
    match points {
        [] => false,
        [single] => single.distance(pos) <= tolerance,
        _ => points
            .windows(2)
            .any(|w| distance_to_line_segment(pos, w[0], w[1]) <= tolerance),
    }
}

pub fn point_in_ellipse(pos: Pos2, center: Pos2, radii: egui::Vec2) -> bool {
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return false;
    }
    let dx = (pos.x - center.x) / radii.x;
    let dy = (pos.y - center.y) / radii.y;
    dx * dx + dy * dy <= 1.0
}

/// Isosceles triangle inscribed in `rect` with its apex at the top-middle
pub fn triangle_points(rect: Rect) -> [Pos2; 3] {
    [rect.center_top(), rect.right_bottom(), rect.left_bottom()]
}

pub fn point_in_triangle(p: Pos2, [a, b, c]: [Pos2; 3]) -> bool {
    let sign = |p1: Pos2, p2: Pos2, p3: Pos2| {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
