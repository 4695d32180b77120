//! Provisional geometry of a shape being dragged out on the page.

use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};

use super::{ShapeKind, ToolMode};
use crate::element::{ObjectKind, ObjectStyle};
use crate::geometry::shapes::{clamp_to, drag_circle, drag_ellipse, drag_line, drag_rect};

/// Freehand points closer than this to the previous one are skipped
const MIN_POINT_DISTANCE: f32 = 0.5;

pub const HIGHLIGHT_WIDTH: f32 = 14.0;
pub const HIGHLIGHT_OPACITY: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstructionKind {
    Shape(ShapeKind),
    Freehand,
    Highlight,
}

impl ConstructionKind {
    pub fn for_mode(mode: ToolMode) -> Option<Self> {
        match mode {
            ToolMode::Shape(kind) => Some(ConstructionKind::Shape(kind)),
            ToolMode::Draw => Some(ConstructionKind::Freehand),
            ToolMode::Highlight => Some(ConstructionKind::Highlight),
            _ => None,
        }
    }
}

/// Style of highlighter strokes: wide and translucent
pub fn highlight_style(color: Color32) -> ObjectStyle {
    ObjectStyle {
        stroke_color: color,
        stroke_width: HIGHLIGHT_WIDTH,
        fill: None,
        opacity: HIGHLIGHT_OPACITY,
    }
}

/// A drag in progress, from pointer-down to pointer-up
#[derive(Debug, Clone, PartialEq)]
pub struct Construction {
    kind: ConstructionKind,
    start: Pos2,
    current: Pos2,
    square: bool,
    points: Vec<Pos2>,
    bounds: Rect,
}

impl Construction {
    /// Start at `start`, clamped into the page `bounds`
    pub fn begin(kind: ConstructionKind, start: Pos2, bounds: Rect) -> Self {
        let start = clamp_to(bounds, start);
        Self {
            kind,
            start,
            current: start,
            square: false,
            points: vec![start],
            bounds,
        }
    }

    pub fn kind(&self) -> ConstructionKind {
        self.kind
    }

    pub fn start(&self) -> Pos2 {
        self.start
    }

    pub fn current(&self) -> Pos2 {
        self.current
    }

    /// Move the free end to `current`; `square` holds the aspect constraint
    pub fn update(&mut self, current: Pos2, square: bool) {
        let current = clamp_to(self.bounds, current);
        self.current = current;
        self.square = square;
        if matches!(self.kind, ConstructionKind::Freehand | ConstructionKind::Highlight) {
            let far_enough = self
                .points
                .last()
                .is_none_or(|last| last.distance(current) >= MIN_POINT_DISTANCE);
            if far_enough {
                self.points.push(current);
            }
        }
    }

    /// Geometry of the provisional object
    pub fn geometry(&self) -> ObjectKind {
        let (start, current, bounds) = (self.start, self.current, self.bounds);
        match self.kind {
            ConstructionKind::Shape(ShapeKind::Rectangle) => ObjectKind::Rectangle {
                rect: drag_rect(start, current, self.square, bounds),
            },
            ConstructionKind::Shape(ShapeKind::Triangle) => ObjectKind::Triangle {
                rect: drag_rect(start, current, self.square, bounds),
            },
            ConstructionKind::Shape(ShapeKind::Circle) => {
                let (center, radius) = drag_circle(start, current, bounds);
                ObjectKind::Circle { center, radius }
            }
            ConstructionKind::Shape(ShapeKind::Ellipse) => {
                let (center, radii) = drag_ellipse(start, current, self.square, bounds);
                ObjectKind::Ellipse { center, radii }
            }
            ConstructionKind::Shape(ShapeKind::Line) => {
                let (start, end) = drag_line(start, current, bounds);
                ObjectKind::Line { start, end }
            }
            ConstructionKind::Shape(ShapeKind::Arrow) => {
                let (start, end) = drag_line(start, current, bounds);
                ObjectKind::Arrow { start, end }
            }
            ConstructionKind::Freehand | ConstructionKind::Highlight => ObjectKind::Freehand {
                points: self.points.clone(),
            },
        }
    }

    /// True when the shape is too small to keep
    pub fn is_degenerate(&self, min_size: f32) -> bool {
        self.geometry().extent() < min_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn page() -> Rect {
        Rect::from_min_max(Pos2::ZERO, pos2(612.0, 792.0))
    }

    #[test]
    fn rectangle_follows_pointer() {
        let mut c = Construction::begin(ConstructionKind::Shape(ShapeKind::Rectangle), pos2(110.0, 60.0), page());
        assert!(c.is_degenerate(3.0));
        c.update(pos2(10.0, 10.0), false);
        let ObjectKind::Rectangle { rect } = c.geometry() else {
            panic!("expected rectangle");
        };
        assert_eq!(rect.min, pos2(10.0, 10.0));
        assert_eq!(rect.size(), vec2(100.0, 50.0));
        assert!(!c.is_degenerate(3.0));
    }

    #[test]
    fn start_outside_page_is_clamped() {
        let c = Construction::begin(ConstructionKind::Shape(ShapeKind::Line), pos2(-20.0, 900.0), page());
        assert_eq!(c.start(), pos2(0.0, 792.0));
    }

    #[test]
    fn freehand_collects_points() {
        let mut c = Construction::begin(ConstructionKind::Freehand, pos2(5.0, 5.0), page());
        c.update(pos2(5.1, 5.0), false);
        c.update(pos2(20.0, 5.0), false);
        c.update(pos2(20.0, 30.0), false);
        let ObjectKind::Freehand { points } = c.geometry() else {
            panic!("expected path");
        };
        assert_eq!(points.len(), 3);
        assert!(!c.is_degenerate(3.0));
    }

    #[test]
    fn tiny_circle_is_degenerate() {
        let mut c = Construction::begin(ConstructionKind::Shape(ShapeKind::Circle), pos2(100.0, 100.0), page());
        c.update(pos2(102.0, 100.0), false);
        assert!(c.is_degenerate(3.0));
    }
}
