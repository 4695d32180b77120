//! Transient state between a pointer-down and the matching pointer-up.
//!
//! ```text
//!              ┌───────────────┐
//!        ┌────►  Constructing ├────┐
//!        │     └───────────────┘    │
//!        │     ┌───────────────┐    │
//! ┌──────┴─┐   │    Moving     │    │ commit / cancel
//! │  Idle  ├──►│    Resizing   ├────┤
//! └──────▲─┘   └───────────────┘    │
//!        │     ┌───────────────┐    │
//!        └─────┤  EditingText  ◄────┘
//!              └───────────────┘
//! ```
//!
//! Every non-idle state only leaves back to `Idle`, so two gestures never
//! overlap.
use egui::Pos2;

use crate::element::{ObjectId, SceneObject, TextCursor};
use crate::geometry::Corner;
use crate::tool::Construction;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionSession {
    #[default]
    Idle,
    /// A shape or path being dragged out. `preview` is not in the scene yet.
    Constructing {
        construction: Construction,
        preview: SceneObject,
    },
    /// Selected objects following the pointer
    Moving {
        start: Pos2,
        originals: Vec<SceneObject>,
    },
    Resizing {
        corner: Corner,
        start: Pos2,
        original: SceneObject,
    },
    /// A text object receiving keystrokes. `before` is `None` for a fresh object.
    EditingText {
        id: ObjectId,
        before: Option<SceneObject>,
        cursor: TextCursor,
    },
}

impl InteractionSession {
    /// Validates whether a transition to the new session is allowed
    pub fn can_transition_to(&self, next: &InteractionSession) -> bool {
        match (self, next) {
            (InteractionSession::Idle, _) => true,
            (_, InteractionSession::Idle) => true,
            _ => false,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionSession::Idle)
    }

    /// True while the pointer is held down on the page
    pub fn is_dragging(&self) -> bool {
        matches!(
            self,
            InteractionSession::Constructing { .. }
                | InteractionSession::Moving { .. }
                | InteractionSession::Resizing { .. }
        )
    }

    pub fn is_editing_text(&self) -> bool {
        matches!(self, InteractionSession::EditingText { .. })
    }

    /// Id of the text object being edited
    pub fn editing_id(&self) -> Option<ObjectId> {
        match self {
            InteractionSession::EditingText { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn text_cursor(&self) -> Option<&TextCursor> {
        match self {
            InteractionSession::EditingText { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    /// Provisional object to draw on top of the scene
    pub fn preview(&self) -> Option<&SceneObject> {
        match self {
            InteractionSession::Constructing { preview, .. } => Some(preview),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionSession::Idle => "idle",
            InteractionSession::Constructing { .. } => "constructing",
            InteractionSession::Moving { .. } => "moving",
            InteractionSession::Resizing { .. } => "resizing",
            InteractionSession::EditingText { .. } => "editing text",
        }
    }
}
