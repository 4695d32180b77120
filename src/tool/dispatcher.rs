use egui::CursorIcon;
use thiserror::Error;

use super::{PointerAction, PointerHandler, PointerHit, ToolMode, handler_for};
use crate::scene::Scene;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("pointer handlers for {0:?} are still bound")]
    AlreadyBound(ToolMode),
}

/// Holds the active tool mode and its bound pointer handler
pub struct ToolDispatcher {
    mode: ToolMode,
    handler: Option<Box<dyn PointerHandler>>,
    cursor: CursorIcon,
}

impl std::fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("mode", &self.mode)
            .field("bound", &self.handler.as_ref().map(|handler| handler.mode()))
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDispatcher {
    /// Starts in `Cursor` mode with its handler bound
    pub fn new() -> Self {
        Self {
            mode: ToolMode::Cursor,
            handler: Some(handler_for(ToolMode::Cursor)),
            cursor: ToolMode::Cursor.cursor_icon(),
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// Mode whose handler is currently bound
    pub fn bound_mode(&self) -> Option<ToolMode> {
        self.handler.as_ref().map(|handler| handler.mode())
    }

    fn unbind(&mut self) {
        if let Some(mut handler) = self.handler.take() {
            handler.on_unbind();
        }
    }

    fn bind(&mut self, handler: Box<dyn PointerHandler>) -> Result<(), TransitionError> {
        if let Some(bound) = &self.handler {
            return Err(TransitionError::AlreadyBound(bound.mode()));
        }
        self.handler = Some(handler);
        Ok(())
    }

    /// Switch to `mode` and return the previous one.
    ///
    /// The caller cancels any construction first. Steps run in this order:
    /// clear selection, unbind old handler, bind new handler, update
    /// selectability, set cursor.
    pub fn select_mode(&mut self, mode: ToolMode, scene: &mut Scene) -> Result<ToolMode, TransitionError> {
        let old = self.mode;
        scene.clear_selection();
        self.unbind();
        self.bind(handler_for(mode))?;
        self.mode = mode;
        scene.set_selectable_all(mode.allows_selection());
        self.cursor = mode.cursor_icon();
        log::info!("Tool changed: {} -> {}", old.name(), mode.name());
        Ok(old)
    }

    pub fn pointer_down(&mut self, hit: &PointerHit) -> PointerAction {
        self.handler
            .as_mut()
            .map_or(PointerAction::Ignore, |handler| handler.on_pointer_down(hit))
    }

    pub fn double_click(&mut self, hit: &PointerHit) -> PointerAction {
        self.handler
            .as_mut()
            .map_or(PointerAction::Ignore, |handler| handler.on_double_click(hit))
    }
}
