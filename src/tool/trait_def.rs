use egui::Pos2;

use super::{ConstructionKind, ToolMode};
use crate::element::ObjectId;
use crate::geometry::Corner;

/// What lies under the pointer, resolved by the editor before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerHit {
    /// Page-space position
    pub pos: Pos2,
    pub shift: bool,
    /// Topmost selectable object
    pub object: Option<ObjectId>,
    /// Topmost visible, unlocked text object
    pub text: Option<ObjectId>,
    /// Resize handle of a selected object
    pub handle: Option<(ObjectId, Corner)>,
}

/// What the editor should do in response to a pointer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    Ignore,
    /// Start a provisional object
    Construct(ConstructionKind),
    PlaceText,
    EditText(ObjectId),
    PlaceStamp,
    PlaceImage,
    /// Select (Shift toggles) and start moving the selection
    SelectAndMove { id: ObjectId, additive: bool },
    Resize { id: ObjectId, corner: Corner },
    ClearSelection,
    Erase(ObjectId),
}

/// Pointer bindings of one tool mode.
///
/// The dispatcher keeps exactly one handler bound.
pub trait PointerHandler: Send {
    fn mode(&self) -> ToolMode;

    /// Handle pointer press on the page
    fn on_pointer_down(&mut self, hit: &PointerHit) -> PointerAction;

    fn on_double_click(&mut self, hit: &PointerHit) -> PointerAction {
        match hit.text {
            Some(id) => PointerAction::EditText(id),
            None => PointerAction::Ignore,
        }
    }

    /// Called when the handler is unbound
    fn on_unbind(&mut self) {}
}
