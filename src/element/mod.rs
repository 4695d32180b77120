use std::fmt;

use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod common;
pub mod image;
pub mod properties;
pub mod text;

pub use common::{MIN_ELEMENT_SIZE, TEXT_LINE_HEIGHT, TEXT_PADDING, arrow_head_points};
pub use image::ImageObject;
pub use properties::{PropertyError, PropertyKey, PropertyValue};
pub use text::{TextCursor, TextObject};

use crate::geometry::hit_testing::{
    self, HIT_SLOP, calculate_bounds, distance_to_line_segment, hits_polyline,
};

/// Stable identifier of a scene object, generated at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometry and content of each object variant, in page space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Text(TextObject),
    Rectangle { rect: Rect },
    Circle { center: Pos2, radius: f32 },
    Ellipse { center: Pos2, radii: Vec2 },
    Triangle { rect: Rect },
    Line { start: Pos2, end: Pos2 },
    Arrow { start: Pos2, end: Pos2 },
    Freehand { points: Vec<Pos2> },
    Image(ImageObject),
    Stamp { rect: Rect, label: String },
}

impl ObjectKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Text(_) => "text",
            ObjectKind::Rectangle { .. } => "rectangle",
            ObjectKind::Circle { .. } => "circle",
            ObjectKind::Ellipse { .. } => "ellipse",
            ObjectKind::Triangle { .. } => "triangle",
            ObjectKind::Line { .. } => "line",
            ObjectKind::Arrow { .. } => "arrow",
            ObjectKind::Freehand { .. } => "freehand",
            ObjectKind::Image(_) => "image",
            ObjectKind::Stamp { .. } => "stamp",
        }
    }

    /// Geometric bounds, without stroke width
    pub fn bounds(&self) -> Rect {
        match self {
            ObjectKind::Text(text) => text.rect(),
            ObjectKind::Rectangle { rect }
            | ObjectKind::Triangle { rect }
            | ObjectKind::Stamp { rect, .. } => *rect,
            ObjectKind::Circle { center, radius } => {
                Rect::from_center_size(*center, Vec2::splat(radius * 2.0))
            }
            ObjectKind::Ellipse { center, radii } => Rect::from_center_size(*center, *radii * 2.0),
            ObjectKind::Line { start, end } | ObjectKind::Arrow { start, end } => {
                Rect::from_two_pos(*start, *end)
            }
            ObjectKind::Freehand { points } => calculate_bounds(points, 0.0),
            ObjectKind::Image(image) => image.rect,
        }
    }

    /// Largest extent along either axis; lines use their length
    pub fn extent(&self) -> f32 {
        match self {
            ObjectKind::Line { start, end } | ObjectKind::Arrow { start, end } => {
                start.distance(*end)
            }
            ObjectKind::Freehand { points } => {
                let size = calculate_bounds(points, 0.0).size();
                if points.len() < 2 { 0.0 } else { size.x.max(size.y) }
            }
            ObjectKind::Circle { radius, .. } => radius * 2.0,
            _ => {
                let size = self.bounds().size();
                size.x.min(size.y)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStyle {
    pub stroke_color: Color32,
    pub stroke_width: f32,
    /// `None` means no fill
    pub fill: Option<Color32>,
    /// 0.0 ..= 1.0
    pub opacity: f32,
}

impl Default for ObjectStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color32::from_rgb(220, 38, 38),
            stroke_width: 2.0,
            fill: None,
            opacity: 1.0,
        }
    }
}

impl ObjectStyle {
    /// Apply opacity to a color
    pub fn faded(&self, color: Color32) -> Color32 {
        color.gamma_multiply(self.opacity.clamp(0.0, 1.0))
    }
}

/// One annotation on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    id: ObjectId,
    /// 1-based page the object is drawn on
    pub page: u32,
    pub kind: ObjectKind,
    pub style: ObjectStyle,
    /// Mirrors the owning layer's visibility
    pub visible: bool,
    /// Set by the active tool mode
    pub selectable: bool,
    /// Mirrors the owning layer's lock
    pub locked: bool,
}

impl SceneObject {
    pub fn new(page: u32, kind: ObjectKind, style: ObjectStyle) -> Self {
        Self {
            id: ObjectId::new(),
            page,
            kind,
            style,
            visible: true,
            selectable: true,
            locked: false,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn bounds(&self) -> Rect {
        self.kind.bounds()
    }

    /// Top-left of the bounds
    pub fn position(&self) -> Pos2 {
        self.bounds().min
    }

    /// Whether the user may currently pick this object
    pub fn can_select(&self) -> bool {
        self.visible && self.selectable && !self.locked
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextObject> {
        match &mut self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Test if the object covers `pos`, with `tolerance` slack for thin shapes
    pub fn hit_test(&self, pos: Pos2, tolerance: f32) -> bool {
        let reach = self.style.stroke_width / 2.0 + tolerance.max(HIT_SLOP);
        match &self.kind {
            ObjectKind::Text(_)
            | ObjectKind::Rectangle { .. }
            | ObjectKind::Image(_)
            | ObjectKind::Stamp { .. } => self.bounds().expand(tolerance).contains(pos),
            ObjectKind::Circle { center, radius } => center.distance(pos) <= radius + reach,
            ObjectKind::Ellipse { center, radii } => {
                hit_testing::point_in_ellipse(pos, *center, *radii + Vec2::splat(reach))
            }
            ObjectKind::Triangle { rect } => {
                hit_testing::point_in_triangle(pos, hit_testing::triangle_points(rect.expand(reach)))
            }
            ObjectKind::Line { start, end } | ObjectKind::Arrow { start, end } => {
                distance_to_line_segment(pos, *start, *end) <= reach
            }
            ObjectKind::Freehand { points } => hits_polyline(points, pos, reach),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.kind {
            ObjectKind::Text(text) => text.anchor += delta,
            ObjectKind::Rectangle { rect }
            | ObjectKind::Triangle { rect }
            | ObjectKind::Stamp { rect, .. } => *rect = rect.translate(delta),
            ObjectKind::Circle { center, .. } | ObjectKind::Ellipse { center, .. } => {
                *center += delta;
            }
            ObjectKind::Line { start, end } | ObjectKind::Arrow { start, end } => {
                *start += delta;
                *end += delta;
            }
            ObjectKind::Freehand { points } => {
                for point in points {
                    *point += delta;
                }
            }
            ObjectKind::Image(image) => image.rect = image.rect.translate(delta),
        }
    }

    /// Move the endpoint of a line or arrow nearest `grabbed` to `pos`.
    ///
    /// Returns false for kinds without endpoints.
    pub fn move_endpoint(&mut self, grabbed: Pos2, pos: Pos2) -> bool {
        match &mut self.kind {
            ObjectKind::Line { start, end } | ObjectKind::Arrow { start, end } => {
                if start.distance(grabbed) <= end.distance(grabbed) {
                    *start = pos;
                } else {
                    *end = pos;
                }
                true
            }
            _ => false,
        }
    }

    /// Fit the object into `new_rect`
    pub fn resize(&mut self, new_rect: Rect) -> Result<(), String> {
        match self.kind {
            // A straight path has zero extent on one axis
            ObjectKind::Line { .. } | ObjectKind::Arrow { .. } | ObjectKind::Freehand { .. } => {
                common::validate_extent(&new_rect)?
            }
            _ => common::validate_rect(&new_rect)?,
        }
        let old_rect = self.bounds();
        match &mut self.kind {
            ObjectKind::Text(text) => {
                if old_rect.height() > 0.0 {
                    let factor = new_rect.height() / old_rect.height();
                    text.font_size = (text.font_size * factor).max(1.0);
                }
                text.anchor = new_rect.min;
            }
            ObjectKind::Rectangle { rect }
            | ObjectKind::Triangle { rect }
            | ObjectKind::Stamp { rect, .. } => *rect = new_rect,
            ObjectKind::Circle { center, radius } => {
                *center = new_rect.center();
                *radius = new_rect.width().min(new_rect.height()) / 2.0;
            }
            ObjectKind::Ellipse { center, radii } => {
                *center = new_rect.center();
                *radii = new_rect.size() / 2.0;
            }
            ObjectKind::Line { start, end } | ObjectKind::Arrow { start, end } => {
                *start = common::remap(*start, old_rect, new_rect);
                *end = common::remap(*end, old_rect, new_rect);
            }
            ObjectKind::Freehand { points } => {
                if old_rect == Rect::NOTHING {
                    return Err("Cannot resize empty stroke".to_string());
                }
                for point in points {
                    *point = common::remap(*point, old_rect, new_rect);
                }
            }
            ObjectKind::Image(image) => image.rect = new_rect,
        }
        Ok(())
    }
}

/// Factory functions for creating objects
pub mod factory {
    use super::*;

    pub fn rectangle(page: u32, rect: Rect, style: ObjectStyle) -> SceneObject {
        SceneObject::new(page, ObjectKind::Rectangle { rect }, style)
    }

    pub fn text(page: u32, anchor: Pos2, content: &str, color: Color32) -> SceneObject {
        let mut text = TextObject::new(anchor, content);
        text.color = color;
        SceneObject::new(page, ObjectKind::Text(text), ObjectStyle::default())
    }

    pub fn freehand(page: u32, points: Vec<Pos2>, style: ObjectStyle) -> SceneObject {
        SceneObject::new(page, ObjectKind::Freehand { points }, style)
    }

    pub fn stamp(page: u32, rect: Rect, label: &str, color: Color32) -> SceneObject {
        let style = ObjectStyle {
            stroke_color: color,
            stroke_width: 3.0,
            fill: None,
            opacity: 0.9,
        };
        SceneObject::new(
            page,
            ObjectKind::Stamp {
                rect,
                label: label.to_owned(),
            },
            style,
        )
    }

    pub fn image(page: u32, image: ImageObject) -> SceneObject {
        SceneObject::new(page, ObjectKind::Image(image), ObjectStyle::default())
    }
}
