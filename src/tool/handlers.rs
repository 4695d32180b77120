use super::{ConstructionKind, PointerAction, PointerHandler, PointerHit, ToolMode};

/// Pointer bindings for `mode`
pub fn handler_for(mode: ToolMode) -> Box<dyn PointerHandler> {
    match mode {
        ToolMode::Cursor => Box::new(CursorHandler),
        ToolMode::Text => Box::new(TextHandler),
        ToolMode::Draw | ToolMode::Shape(_) | ToolMode::Highlight => Box::new(ConstructionHandler { mode }),
        ToolMode::Image | ToolMode::Stamp => Box::new(PlacementHandler { mode }),
        ToolMode::Eraser => Box::new(EraserHandler),
    }
}

struct CursorHandler;

impl PointerHandler for CursorHandler {
    fn mode(&self) -> ToolMode {
        ToolMode::Cursor
    }

    fn on_pointer_down(&mut self, hit: &PointerHit) -> PointerAction {
        if let Some((id, corner)) = hit.handle {
            return PointerAction::Resize { id, corner };
        }
        match hit.object {
            Some(id) => PointerAction::SelectAndMove {
                id,
                additive: hit.shift,
            },
            None if hit.shift => PointerAction::Ignore,
            None => PointerAction::ClearSelection,
        }
    }
}

struct TextHandler;

impl PointerHandler for TextHandler {
    fn mode(&self) -> ToolMode {
        ToolMode::Text
    }

    fn on_pointer_down(&mut self, hit: &PointerHit) -> PointerAction {
        match hit.text {
            Some(id) => PointerAction::EditText(id),
            None => PointerAction::PlaceText,
        }
    }
}

struct ConstructionHandler {
    mode: ToolMode,
}

impl PointerHandler for ConstructionHandler {
    fn mode(&self) -> ToolMode {
        self.mode
    }

    fn on_pointer_down(&mut self, _hit: &PointerHit) -> PointerAction {
        ConstructionKind::for_mode(self.mode).map_or(PointerAction::Ignore, PointerAction::Construct)
    }

    fn on_double_click(&mut self, _hit: &PointerHit) -> PointerAction {
        PointerAction::Ignore
    }
}

struct PlacementHandler {
    mode: ToolMode,
}

impl PointerHandler for PlacementHandler {
    fn mode(&self) -> ToolMode {
        self.mode
    }

    fn on_pointer_down(&mut self, _hit: &PointerHit) -> PointerAction {
        match self.mode {
            ToolMode::Stamp => PointerAction::PlaceStamp,
            ToolMode::Image => PointerAction::PlaceImage,
            _ => PointerAction::Ignore,
        }
    }

    fn on_double_click(&mut self, _hit: &PointerHit) -> PointerAction {
        PointerAction::Ignore
    }
}

struct EraserHandler;

impl PointerHandler for EraserHandler {
    fn mode(&self) -> ToolMode {
        ToolMode::Eraser
    }

    fn on_pointer_down(&mut self, hit: &PointerHit) -> PointerAction {
        hit.object.map_or(PointerAction::Ignore, PointerAction::Erase)
    }

    fn on_double_click(&mut self, _hit: &PointerHit) -> PointerAction {
        PointerAction::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ObjectId;
    use crate::geometry::Corner;
    use crate::tool::ShapeKind;

    #[test]
    fn cursor_prefers_handles_over_objects() {
        let id = ObjectId::new();
        let hit = PointerHit {
            object: Some(id),
            handle: Some((id, Corner::TopLeft)),
            ..Default::default()
        };
        let mut handler = handler_for(ToolMode::Cursor);
        assert_eq!(
            handler.on_pointer_down(&hit),
            PointerAction::Resize { id, corner: Corner::TopLeft }
        );
    }

    #[test]
    fn shape_mode_always_constructs() {
        let mode = ToolMode::Shape(ShapeKind::Ellipse);
        let hit = PointerHit { object: Some(ObjectId::new()), ..Default::default() };
        let mut handler = handler_for(mode);
        assert_eq!(handler.mode(), mode);
        assert_eq!(
            handler.on_pointer_down(&hit),
            PointerAction::Construct(ConstructionKind::Shape(ShapeKind::Ellipse))
        );
    }

    #[test]
    fn text_mode_reopens_existing_text() {
        let id = ObjectId::new();
        let mut handler = handler_for(ToolMode::Text);
        assert_eq!(handler.on_pointer_down(&PointerHit::default()), PointerAction::PlaceText);
        let hit = PointerHit { text: Some(id), ..Default::default() };
        assert_eq!(handler.on_pointer_down(&hit), PointerAction::EditText(id));
    }
}
