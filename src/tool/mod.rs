pub mod construction;
pub mod dispatcher;
mod handlers;
mod trait_def;

use egui::CursorIcon;
use serde::{Deserialize, Serialize};

pub use construction::{Construction, ConstructionKind};
pub use dispatcher::{ToolDispatcher, TransitionError};
pub use handlers::handler_for;
pub use trait_def::{PointerAction, PointerHandler, PointerHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Ellipse,
    Triangle,
    Line,
    Arrow,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::Ellipse,
        ShapeKind::Triangle,
        ShapeKind::Line,
        ShapeKind::Arrow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::Line => "Line",
            ShapeKind::Arrow => "Arrow",
        }
    }
}

/// The active interaction mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolMode {
    #[default]
    Cursor,
    Text,
    Draw,
    Shape(ShapeKind),
    Highlight,
    Image,
    Stamp,
    Eraser,
}

impl ToolMode {
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::Cursor => "Select",
            ToolMode::Text => "Text",
            ToolMode::Draw => "Draw",
            ToolMode::Shape(kind) => kind.name(),
            ToolMode::Highlight => "Highlight",
            ToolMode::Image => "Image",
            ToolMode::Stamp => "Stamp",
            ToolMode::Eraser => "Eraser",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            ToolMode::Cursor => CursorIcon::Default,
            ToolMode::Text => CursorIcon::Text,
            ToolMode::Draw | ToolMode::Highlight | ToolMode::Shape(_) => CursorIcon::Crosshair,
            ToolMode::Image | ToolMode::Stamp => CursorIcon::Copy,
            ToolMode::Eraser => CursorIcon::NotAllowed,
        }
    }

    /// Whether existing objects may be picked while this mode is active
    pub fn allows_selection(&self) -> bool {
        matches!(self, ToolMode::Cursor | ToolMode::Eraser)
    }

    /// One-shot modes go back to `Cursor` after placing their object
    pub fn auto_returns(&self) -> bool {
        matches!(self, ToolMode::Stamp | ToolMode::Image)
    }

    /// Whether pointer-down starts an interactive construction
    pub fn constructs(&self) -> bool {
        matches!(self, ToolMode::Draw | ToolMode::Shape(_) | ToolMode::Highlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cursor_and_eraser_allow_selection() {
        assert!(ToolMode::Cursor.allows_selection());
        assert!(ToolMode::Eraser.allows_selection());
        assert!(!ToolMode::Draw.allows_selection());
        assert!(!ToolMode::Shape(ShapeKind::Circle).allows_selection());
        assert!(!ToolMode::Text.allows_selection());
    }

    #[test]
    fn one_shot_modes() {
        assert!(ToolMode::Stamp.auto_returns());
        assert!(ToolMode::Image.auto_returns());
        assert!(!ToolMode::Shape(ShapeKind::Rectangle).auto_returns());
    }
}
