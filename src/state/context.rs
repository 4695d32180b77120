//! The editor store: the single owner of scene, layers, history, tool mode
//! and the interaction session.
//!
//! UI code never mutates those parts directly. It calls the methods here,
//! which keep the object/layer/history model consistent and broadcast an
//! [`EditorEvent`] for every change.

use egui::{CursorIcon, Pos2, Rect, Vec2, vec2};

use super::editor_state::InteractionSession;
use super::persistence::{EditorSnapshot, Preferences};
use crate::command::{Command, CommandContext, CommandHistory};
use crate::config::EditorConfig;
use crate::element::text::PLACEHOLDER_TEXT;
use crate::element::{
    ImageObject, ObjectId, ObjectKind, ObjectStyle, PropertyError, PropertyKey, PropertyValue,
    SceneObject, TextCursor, TextObject, factory,
};
use crate::error::{EditorError, EditorResult};
use crate::event::{DocumentEvent, EditorEvent, EventBus, EventHandler, LayerEvent};
use crate::geometry::Corner;
use crate::geometry::hit_testing::HIT_SLOP;
use crate::geometry::shapes::{clamp_to, resize_rect, snap_to_grid};
use crate::layer::{Layer, LayerId, LayerStack};
use crate::scene::Scene;
use crate::tool::construction::highlight_style;
use crate::tool::{
    Construction, ConstructionKind, PointerAction, PointerHit, ToolDispatcher, ToolMode,
};
use crate::util::time::current_time_secs;

/// Default page area before a document is loaded (US Letter in points)
pub const DEFAULT_PAGE_SIZE: Vec2 = vec2(612.0, 792.0);

const STAMP_HEIGHT: f32 = 36.0;
const STAMP_CHAR_WIDTH: f32 = 14.0;
const STAMP_PADDING: f32 = 12.0;

/// Editor store. See the module docs.
#[derive(Debug)]
pub struct Editor {
    config: EditorConfig,
    preferences: Preferences,
    scene: Scene,
    layers: LayerStack,
    history: CommandHistory,
    dispatcher: ToolDispatcher,
    session: InteractionSession,
    /// 1-based page the user is looking at
    page: u32,
    /// Page area in page space; construction is clamped into it
    page_bounds: Rect,
    /// Display pixels per page unit, used to size hit targets
    view_scale: f32,
    pending_image: Option<ImageObject>,
    event_bus: EventBus,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default(), Preferences::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig, preferences: Preferences) -> Self {
        Self {
            history: CommandHistory::new(config.history_limit),
            config,
            preferences,
            scene: Scene::new(),
            layers: LayerStack::new(),
            dispatcher: ToolDispatcher::new(),
            session: InteractionSession::Idle,
            page: 1,
            page_bounds: Rect::from_min_size(Pos2::ZERO, DEFAULT_PAGE_SIZE),
            view_scale: 1.0,
            pending_image: None,
            event_bus: EventBus::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn mode(&self) -> ToolMode {
        self.dispatcher.mode()
    }

    pub fn cursor(&self) -> CursorIcon {
        self.dispatcher.cursor()
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_bounds(&self) -> Rect {
        self.page_bounds
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.event_bus.subscribe(handler);
    }

    fn emit(&self, event: EditorEvent) {
        self.event_bus.emit(event);
    }

    /// Broadcast a change made to the document session
    pub fn notify_document(&self, event: DocumentEvent) {
        log::debug!("Document event: {:?}", event);
        self.emit(EditorEvent::DocumentChanged(event));
    }

    /// Broadcast a user-facing error
    pub fn report_error(&self, message: impl Into<String>) {
        self.emit(EditorEvent::Error(message.into()));
    }

    fn emit_selection(&self) {
        self.emit(EditorEvent::SelectionChanged(
            self.scene.selection().iter().copied().collect(),
        ));
    }

    fn emit_history(&self) {
        self.emit(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    // ---------------------------------------------------------------------
    // Document and page context

    /// Start over for a freshly loaded document: empty scene, one default
    /// layer, empty history.
    pub fn reset_for_document(&mut self, first_page_size: Vec2) {
        self.session = InteractionSession::Idle;
        self.scene.clear();
        self.layers = LayerStack::new();
        self.history.clear();
        self.page = 1;
        self.page_bounds = Rect::from_min_size(Pos2::ZERO, first_page_size);
        log::info!("Editor reset for new document");
        self.emit_selection();
        self.emit_history();
        self.emit(EditorEvent::RepaintRequested);
    }

    /// Point the editor at another page. Any gesture in progress is cancelled.
    pub fn set_page(&mut self, page: u32, page_size: Vec2) {
        self.cancel_interaction();
        if self.page != page {
            self.scene.clear_selection();
            self.emit_selection();
        }
        self.page = page;
        self.page_bounds = Rect::from_min_size(Pos2::ZERO, page_size);
        self.emit(EditorEvent::RepaintRequested);
    }

    /// Zoom or rotation changed. Any gesture in progress is cancelled.
    pub fn set_view_scale(&mut self, scale: f32) {
        if (scale - self.view_scale).abs() > f32::EPSILON {
            self.cancel_interaction();
        }
        self.view_scale = scale.max(f32::EPSILON);
    }

    /// Image the next click in image mode places
    pub fn set_pending_image(&mut self, image: ImageObject) {
        self.pending_image = Some(image);
    }

    pub fn has_pending_image(&self) -> bool {
        self.pending_image.is_some()
    }

    // ---------------------------------------------------------------------
    // Tool modes

    /// Switch the active tool. Cancels any construction in progress.
    pub fn select_mode(&mut self, mode: ToolMode) -> EditorResult<()> {
        self.cancel_interaction();
        let old = self.dispatcher.select_mode(mode, &mut self.scene)?;
        self.emit(EditorEvent::ToolChanged { old, new: mode });
        self.emit_selection();
        Ok(())
    }

    fn selectable(&self) -> bool {
        self.mode().allows_selection()
    }

    // ---------------------------------------------------------------------
    // Pointer input (page space)

    fn tolerance(&self) -> f32 {
        HIT_SLOP / self.view_scale
    }

    fn resolve_hit(&self, pos: Pos2, shift: bool) -> PointerHit {
        let order = self.layers.paint_order();
        let tolerance = self.tolerance();
        let object = self.scene.hit_test(self.page, pos, &order, tolerance);
        let text = self.scene.topmost(self.page, pos, &order, tolerance, |object| {
            object.visible && !object.locked && object.as_text().is_some()
        });
        let handle_radius = self.config.handle_radius / self.view_scale;
        let handle = if self.scene.selection().len() == 1 {
            self.scene.selection().iter().find_map(|id| {
                let object = self.scene.get(*id)?;
                Corner::hit(object.bounds(), pos, handle_radius).map(|corner| (*id, corner))
            })
        } else {
            None
        };
        PointerHit {
            pos,
            shift,
            object,
            text,
            handle,
        }
    }

    pub fn pointer_down(&mut self, pos: Pos2, shift: bool) -> EditorResult<()> {
        if self.session.is_editing_text() {
            self.commit_text_edit()?;
        }
        if !self.session.is_idle() {
            log::debug!("Ignoring pointer-down during {}", self.session.name());
            return Ok(());
        }

        let hit = self.resolve_hit(pos, shift);
        let action = self.dispatcher.pointer_down(&hit);
        log::debug!("Pointer down at {:?}: {:?}", pos, action);
        match action {
            PointerAction::Ignore => {}
            PointerAction::Construct(kind) => self.begin_construction(kind, self.snap(pos)),
            PointerAction::PlaceText => self.place_text(pos)?,
            PointerAction::EditText(id) => self.begin_text_edit(id)?,
            PointerAction::PlaceStamp => self.place_stamp(pos)?,
            PointerAction::PlaceImage => self.place_image(pos)?,
            PointerAction::SelectAndMove { id, additive } => {
                self.scene.select(id, additive);
                self.emit_selection();
                if self.scene.is_selected(id) {
                    let originals = self
                        .scene
                        .selection()
                        .iter()
                        .filter_map(|id| self.scene.get(*id).cloned())
                        .collect();
                    self.session = InteractionSession::Moving { start: pos, originals };
                }
            }
            PointerAction::Resize { id, corner } => {
                let original = self.scene.object(id)?.clone();
                self.session = InteractionSession::Resizing {
                    corner,
                    start: pos,
                    original,
                };
            }
            PointerAction::ClearSelection => {
                if self.scene.clear_selection() {
                    self.emit_selection();
                }
            }
            PointerAction::Erase(id) => self.remove_object(id)?,
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, pos: Pos2, shift: bool) {
        let bounds = self.page_bounds;
        let snapped = self.snap(pos);
        match &mut self.session {
            InteractionSession::Constructing { construction, preview } => {
                construction.update(snapped, shift);
                preview.kind = construction.geometry();
            }
            InteractionSession::Moving { start, originals } => {
                let delta = pos - *start;
                for original in originals.iter() {
                    let mut moved = original.clone();
                    moved.translate(clamped_delta(original.bounds(), delta, bounds));
                    if let Some(object) = self.scene.get_mut(original.id()) {
                        object.kind = moved.kind;
                    }
                }
            }
            InteractionSession::Resizing { corner, original, .. } => {
                let mut resized = original.clone();
                // Lines and arrows drag the endpoint under the handle
                let grabbed = corner.position(original.bounds());
                let changed = resized.move_endpoint(grabbed, clamp_to(bounds, pos))
                    || resized
                        .resize(resize_rect(original.bounds(), *corner, pos, shift, bounds))
                        .is_ok();
                if changed {
                    if let Some(object) = self.scene.get_mut(original.id()) {
                        object.kind = resized.kind;
                    }
                }
            }
            InteractionSession::Idle | InteractionSession::EditingText { .. } => return,
        }
        self.emit(EditorEvent::RepaintRequested);
    }

    pub fn pointer_up(&mut self, pos: Pos2, shift: bool) -> EditorResult<()> {
        if !self.session.is_dragging() {
            return Ok(());
        }
        self.pointer_move(pos, shift);
        match std::mem::take(&mut self.session) {
            InteractionSession::Constructing { construction, mut preview } => {
                if construction.is_degenerate(self.config.min_shape_size) {
                    log::debug!("Discarding degenerate {}", preview.type_name());
                    self.emit(EditorEvent::RepaintRequested);
                    return Ok(());
                }
                preview.kind = construction.geometry();
                self.add_object(preview)?;
            }
            InteractionSession::Moving { originals, .. } => {
                let commands: Vec<Command> = originals
                    .into_iter()
                    .filter_map(|before| {
                        let after = self.scene.get(before.id())?.clone();
                        (after.kind != before.kind).then_some(Command::ModifyObject { before, after })
                    })
                    .collect();
                self.record_applied(commands, "Move objects");
            }
            InteractionSession::Resizing { original, .. } => {
                if let Some(after) = self.scene.get(original.id()).cloned() {
                    if after.kind != original.kind {
                        self.record_applied(
                            vec![Command::ModifyObject { before: original, after }],
                            "Resize",
                        );
                    }
                }
            }
            other => self.session = other,
        }
        Ok(())
    }

    pub fn double_click(&mut self, pos: Pos2) -> EditorResult<()> {
        if self.session.is_dragging() {
            return Ok(());
        }
        let hit = self.resolve_hit(pos, false);
        match self.dispatcher.double_click(&hit) {
            PointerAction::EditText(id) => self.begin_text_edit(id),
            _ => Ok(()),
        }
    }

    /// Abort the current gesture. Provisional objects are dropped and moved or
    /// resized objects snap back; nothing is recorded. Text edits are committed.
    pub fn cancel_interaction(&mut self) {
        match std::mem::take(&mut self.session) {
            InteractionSession::Idle => return,
            InteractionSession::Constructing { preview, .. } => {
                log::debug!("Cancelled construction of {}", preview.type_name());
            }
            InteractionSession::Moving { originals, .. } => {
                for original in originals {
                    if let Some(object) = self.scene.get_mut(original.id()) {
                        object.kind = original.kind;
                    }
                }
            }
            InteractionSession::Resizing { original, .. } => {
                if let Some(object) = self.scene.get_mut(original.id()) {
                    object.kind = original.kind;
                }
            }
            editing @ InteractionSession::EditingText { .. } => {
                self.session = editing;
                if let Err(err) = self.commit_text_edit() {
                    log::error!("Committing text edit on cancel failed: {}", err);
                }
            }
        }
        self.emit(EditorEvent::RepaintRequested);
    }

    fn begin_construction(&mut self, kind: ConstructionKind, pos: Pos2) {
        let construction = Construction::begin(kind, pos, self.page_bounds);
        let style = match kind {
            ConstructionKind::Highlight => highlight_style(self.preferences.highlight_color),
            ConstructionKind::Freehand => self.stroke_style(None),
            ConstructionKind::Shape(_) => self.stroke_style(self.preferences.fill_color),
        };
        let mut preview = SceneObject::new(self.page, construction.geometry(), style);
        preview.selectable = false;
        let line_like = matches!(
            preview.kind,
            ObjectKind::Line { .. } | ObjectKind::Arrow { .. }
        );
        if line_like {
            preview.style.fill = None;
        }
        self.session = InteractionSession::Constructing { construction, preview };
    }

    /// Construction points land on the grid while snapping is on
    fn snap(&self, pos: Pos2) -> Pos2 {
        if self.preferences.snap_to_grid {
            snap_to_grid(pos, self.config.grid_spacing)
        } else {
            pos
        }
    }

    fn stroke_style(&self, fill: Option<egui::Color32>) -> ObjectStyle {
        ObjectStyle {
            stroke_color: self.preferences.stroke_color,
            stroke_width: self.preferences.stroke_width,
            fill,
            opacity: 1.0,
        }
    }

    fn place_stamp(&mut self, pos: Pos2) -> EditorResult<()> {
        let label = self.config.default_stamp.clone();
        let size = vec2(
            label.chars().count() as f32 * STAMP_CHAR_WIDTH + STAMP_PADDING * 2.0,
            STAMP_HEIGHT,
        );
        let rect = place_within(pos, size, self.page_bounds);
        let stamp = factory::stamp(self.page, rect, &label, self.preferences.stroke_color);
        self.add_object(stamp)?;
        self.finish_one_shot()
    }

    fn place_image(&mut self, pos: Pos2) -> EditorResult<()> {
        let Some(mut image) = self.pending_image.take() else {
            log::warn!("Image mode click without a pending image");
            self.emit(EditorEvent::Error("Choose an image to place first.".to_owned()));
            return Ok(());
        };
        if !image.is_valid() {
            self.emit(EditorEvent::Error("The chosen image could not be read.".to_owned()));
            return Ok(());
        }
        let natural = vec2(image.size[0] as f32, image.size[1] as f32);
        let limit = self.page_bounds.size() * 0.5;
        let fit = (limit.x / natural.x).min(limit.y / natural.y).min(1.0);
        image.rect = place_within(pos, natural * fit, self.page_bounds);
        self.add_object(factory::image(self.page, image))?;
        self.finish_one_shot()
    }

    fn finish_one_shot(&mut self) -> EditorResult<()> {
        if self.mode().auto_returns() {
            self.select_mode(ToolMode::Cursor)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Text editing

    fn place_text(&mut self, pos: Pos2) -> EditorResult<()> {
        let mut text = TextObject::new(pos, PLACEHOLDER_TEXT);
        text.font_family = self.preferences.font_family.clone();
        text.font_size = self.preferences.font_size;
        text.color = self.preferences.text_color;
        let mut object = SceneObject::new(self.page, ObjectKind::Text(text), ObjectStyle::default());
        // Keep the box on the page
        let rect = object.bounds();
        let fitted = place_within(rect.center(), rect.size(), self.page_bounds);
        object.translate(fitted.min - rect.min);

        let id = object.id();
        let cursor = TextCursor::select_all(PLACEHOLDER_TEXT);
        self.attach(object)?;
        self.session = InteractionSession::EditingText { id, before: None, cursor };
        log::debug!("Placed text {}", id);
        self.emit(EditorEvent::TextEditingStarted(id));
        Ok(())
    }

    /// Re-enter editing of an existing text object
    pub fn begin_text_edit(&mut self, id: ObjectId) -> EditorResult<()> {
        if self.session.editing_id() == Some(id) {
            return Ok(());
        }
        if self.session.is_editing_text() {
            self.commit_text_edit()?;
        }
        let object = self.scene.object(id)?;
        let Some(text) = object.as_text() else {
            return Ok(());
        };
        let cursor = TextCursor {
            caret: text.content.chars().count(),
            select_all: false,
        };
        self.session = InteractionSession::EditingText {
            id,
            before: Some(object.clone()),
            cursor,
        };
        self.emit(EditorEvent::TextEditingStarted(id));
        Ok(())
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut TextCursor, &mut String)) {
        let InteractionSession::EditingText { id, cursor, .. } = &mut self.session else {
            return;
        };
        if let Some(text) = self.scene.get_mut(*id).and_then(SceneObject::as_text_mut) {
            edit(cursor, &mut text.content);
            self.event_bus.emit(EditorEvent::RepaintRequested);
        }
    }

    /// Type into the text being edited
    pub fn text_input(&mut self, input: &str) {
        self.edit_text(|cursor, content| cursor.insert(content, input));
    }

    pub fn backspace(&mut self) {
        self.edit_text(|cursor, content| cursor.backspace(content));
    }

    pub fn caret_left(&mut self) {
        self.edit_text(|cursor, _| cursor.move_left());
    }

    pub fn caret_right(&mut self) {
        self.edit_text(|cursor, content| cursor.move_right(content));
    }

    /// Finish text editing and record the result.
    ///
    /// New text records one AddObject. Edits record one ModifyObject.
    /// Text left empty is removed.
    pub fn commit_text_edit(&mut self) -> EditorResult<()> {
        let InteractionSession::EditingText { id, before, .. } = std::mem::take(&mut self.session) else {
            return Ok(());
        };
        let Some(after) = self.scene.get(id).cloned() else {
            return Ok(());
        };
        let empty = after.as_text().is_none_or(|text| text.content.trim().is_empty());
        let Some((layer, index)) = self.layers.layer_of(id) else {
            return Err(EditorError::UnknownObject(id));
        };

        match (before, empty) {
            (None, true) => {
                self.detach(id);
            }
            (None, false) => {
                self.record_applied(vec![Command::AddObject { object: after, layer, index }], "Add text");
                self.emit(EditorEvent::ObjectAdded(id));
            }
            (Some(before), true) => {
                self.detach(id);
                self.record_applied(
                    vec![Command::RemoveObject { object: before, layer, index }],
                    "Remove text",
                );
                self.emit(EditorEvent::ObjectRemoved(id));
            }
            (Some(before), false) => {
                if before != after {
                    self.record_applied(vec![Command::ModifyObject { before, after }], "Edit text");
                    self.emit(EditorEvent::ObjectModified(id));
                }
            }
        }
        self.emit(EditorEvent::RepaintRequested);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Object mutations. Each records exactly one history entry.

    fn context(&mut self) -> CommandContext<'_> {
        let selectable = self.selectable();
        CommandContext::new(&mut self.scene, &mut self.layers, selectable)
    }

    fn execute(&mut self, command: Command) -> EditorResult<()> {
        let selectable = self.selectable();
        let mut ctx = CommandContext::new(&mut self.scene, &mut self.layers, selectable);
        self.history.execute(command, &mut ctx)?;
        self.emit_history();
        Ok(())
    }

    /// Record commands whose effect is already in the scene
    fn record_applied(&mut self, mut commands: Vec<Command>, label: &str) {
        let command = match commands.len() {
            0 => return,
            1 => commands.remove(0),
            _ => Command::Batch {
                label: label.to_owned(),
                commands,
            },
        };
        self.history.record(command);
        self.emit_history();
    }

    /// Put an object in the scene under the active layer without recording it
    fn attach(&mut self, object: SceneObject) -> EditorResult<ObjectId> {
        let layer = self.layers.active_id();
        let index = self.layers.active().objects.len();
        Command::AddObject { object: object.clone(), layer, index }
            .execute(&mut self.context())?;
        Ok(object.id())
    }

    fn detach(&mut self, id: ObjectId) {
        self.scene.remove(id);
        self.layers.unassign(id);
    }

    /// Add an object on top of the active layer
    pub fn add_object(&mut self, object: SceneObject) -> EditorResult<ObjectId> {
        let id = object.id();
        let layer = self.layers.active_id();
        let index = self.layers.active().objects.len();
        self.execute(Command::AddObject { object, layer, index })?;
        log::debug!("Added object {} to layer {}", id, layer);
        self.emit(EditorEvent::ObjectAdded(id));
        self.emit(EditorEvent::RepaintRequested);
        Ok(id)
    }

    fn unknown_object(&self, operation: &str, id: ObjectId) -> EditorError {
        log::error!("{}: unknown object {}", operation, id);
        debug_assert!(false, "{operation} called with unknown object {id}");
        EditorError::UnknownObject(id)
    }

    fn remove_command(&self, id: ObjectId) -> Option<Command> {
        let object = self.scene.get(id)?.clone();
        let (layer, index) = self.layers.layer_of(id)?;
        Some(Command::RemoveObject { object, layer, index })
    }

    pub fn remove_object(&mut self, id: ObjectId) -> EditorResult<()> {
        let command = self
            .remove_command(id)
            .ok_or_else(|| self.unknown_object("remove_object", id))?;
        if self.session.editing_id() == Some(id) {
            self.session = InteractionSession::Idle;
        }
        self.execute(command)?;
        self.emit(EditorEvent::ObjectRemoved(id));
        self.emit_selection();
        self.emit(EditorEvent::RepaintRequested);
        Ok(())
    }

    fn modify_command(&self, id: ObjectId, key: PropertyKey, value: PropertyValue) -> EditorResult<Option<Command>> {
        let before = self.scene.object(id)?.clone();
        let mut after = before.clone();
        after.set_property(key, value)?;
        Ok((after != before).then_some(Command::ModifyObject { before, after }))
    }

    pub fn property(&self, id: ObjectId, key: PropertyKey) -> EditorResult<Option<PropertyValue>> {
        self.scene.property(id, key)
    }

    /// Change one property of one object
    pub fn set_property(&mut self, id: ObjectId, key: PropertyKey, value: PropertyValue) -> EditorResult<()> {
        if !self.scene.contains(id) {
            return Err(self.unknown_object("set_property", id));
        }
        if let Some(command) = self.modify_command(id, key, value)? {
            self.execute(command)?;
            self.emit(EditorEvent::ObjectModified(id));
            self.emit(EditorEvent::RepaintRequested);
        }
        Ok(())
    }

    /// Value of `key` shown in the property editor: the first selected object
    /// that has it
    pub fn selection_property(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.scene
            .selection()
            .iter()
            .filter_map(|id| self.scene.get(*id))
            .find_map(|object| object.property(key))
    }

    /// Apply a property to every selected object it applies to, as one
    /// history entry. Returns how many objects changed.
    pub fn set_selection_property(&mut self, key: PropertyKey, value: PropertyValue) -> EditorResult<usize> {
        let mut commands = Vec::new();
        for id in self.scene.selection().iter().copied() {
            match self.modify_command(id, key, value.clone()) {
                Ok(Some(command)) => commands.push(command),
                Ok(None) | Err(EditorError::Property(PropertyError::NotApplicable { .. })) => {}
                Err(err) => return Err(err),
            }
        }
        let changed = commands.len();
        let command = match changed {
            0 => return Ok(0),
            1 => commands.remove(0),
            _ => Command::Batch {
                label: format!("Set {}", key.name()),
                commands,
            },
        };
        let ids = command.object_ids();
        self.execute(command)?;
        for id in ids {
            self.emit(EditorEvent::ObjectModified(id));
        }
        self.emit(EditorEvent::RepaintRequested);
        Ok(changed)
    }

    /// Removal commands for `ids`, ordered so stored z-positions stay valid
    fn removal_batch(&self, ids: impl IntoIterator<Item = ObjectId>) -> Vec<Command> {
        let mut located: Vec<(usize, usize, ObjectId)> = ids
            .into_iter()
            .filter_map(|id| {
                let (layer, index) = self.layers.layer_of(id)?;
                Some((self.layers.index_of(layer)?, index, id))
            })
            .collect();
        // Highest z first within each layer
        located.sort_by(|a, b| b.cmp(a));
        located
            .into_iter()
            .filter_map(|(_, _, id)| self.remove_command(id))
            .collect()
    }

    /// Remove every selected object as one history entry
    pub fn delete_selection(&mut self) -> EditorResult<usize> {
        self.cancel_interaction();
        let mut commands = self.removal_batch(self.scene.selection().iter().copied().collect::<Vec<_>>());
        let removed = commands.len();
        let command = match removed {
            0 => return Ok(0),
            1 => commands.remove(0),
            _ => Command::Batch {
                label: format!("Delete {removed} objects"),
                commands,
            },
        };
        let ids = command.object_ids();
        self.execute(command)?;
        for id in ids {
            self.emit(EditorEvent::ObjectRemoved(id));
        }
        self.emit_selection();
        self.emit(EditorEvent::RepaintRequested);
        Ok(removed)
    }

    pub fn select(&mut self, id: ObjectId, additive: bool) -> bool {
        let selected = self.scene.select(id, additive);
        if selected {
            self.emit_selection();
        }
        selected
    }

    pub fn clear_selection(&mut self) {
        if self.scene.clear_selection() {
            self.emit_selection();
        }
    }

    // ---------------------------------------------------------------------
    // Layers

    pub fn add_layer(&mut self, name: Option<&str>) -> LayerId {
        let id = self.layers.add_layer(name);
        self.emit(EditorEvent::LayerChanged(LayerEvent::Added(id)));
        id
    }

    /// Delete a layer together with its objects, as one undoable entry.
    /// Does nothing and returns false if it is the only layer.
    pub fn delete_layer(&mut self, id: LayerId) -> EditorResult<bool> {
        let layer = self.layers.get(id).cloned().ok_or(EditorError::UnknownLayer(id))?;
        if self.layers.len() == 1 {
            log::info!("Ignoring delete of the last layer");
            return Ok(false);
        }
        self.cancel_interaction();
        let index = self.layers.index_of(id).unwrap_or_default();
        let mut commands = self.removal_batch(layer.objects.iter().copied());
        let emptied = Layer {
            objects: Vec::new(),
            ..layer.clone()
        };
        commands.push(Command::DeleteLayer { index, layer: emptied });
        self.execute(Command::Batch {
            label: format!("Delete layer '{}'", layer.name),
            commands,
        })?;
        self.emit(EditorEvent::LayerChanged(LayerEvent::Removed(id)));
        self.emit_selection();
        self.emit(EditorEvent::RepaintRequested);
        Ok(true)
    }

    pub fn toggle_layer_visibility(&mut self, id: LayerId) -> EditorResult<bool> {
        let visible = self.layers.toggle_visibility(id)?;
        self.sync_layer_flags(id);
        log::info!("Layer {} visible: {}", id, visible);
        self.emit(EditorEvent::LayerChanged(LayerEvent::VisibilityChanged { id, visible }));
        self.emit(EditorEvent::RepaintRequested);
        Ok(visible)
    }

    pub fn toggle_layer_lock(&mut self, id: LayerId) -> EditorResult<bool> {
        let locked = self.layers.toggle_lock(id)?;
        self.sync_layer_flags(id);
        log::info!("Layer {} locked: {}", id, locked);
        self.emit(EditorEvent::LayerChanged(LayerEvent::LockChanged { id, locked }));
        Ok(locked)
    }

    /// Copy a layer's visible/locked flags onto its members
    fn sync_layer_flags(&mut self, id: LayerId) {
        let Some(layer) = self.layers.get(id) else {
            return;
        };
        for object_id in &layer.objects {
            if let Some(object) = self.scene.get_mut(*object_id) {
                object.visible = layer.visible;
                object.locked = layer.locked;
            }
        }
        let before = self.scene.selection().len();
        self.scene.prune_selection();
        if self.scene.selection().len() != before {
            self.emit_selection();
        }
        if let Some(editing) = self.session.editing_id() {
            if !self.scene.get(editing).is_some_and(|o| o.visible && !o.locked) {
                if let Err(err) = self.commit_text_edit() {
                    log::error!("Committing text edit failed: {}", err);
                }
            }
        }
    }

    pub fn rename_layer(&mut self, id: LayerId, name: &str) -> EditorResult<()> {
        self.layers.rename(id, name)?;
        self.emit(EditorEvent::LayerChanged(LayerEvent::Renamed(id)));
        Ok(())
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> EditorResult<()> {
        self.layers.set_active(id)?;
        self.emit(EditorEvent::LayerChanged(LayerEvent::ActiveChanged(id)));
        Ok(())
    }

    pub fn move_layer(&mut self, id: LayerId, new_index: usize) -> EditorResult<()> {
        self.layers.move_layer(id, new_index)?;
        self.emit(EditorEvent::LayerChanged(LayerEvent::Reordered { id, new_index }));
        self.emit(EditorEvent::RepaintRequested);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // History

    /// Revert the newest entry. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.cancel_interaction();
        let selectable = self.selectable();
        let mut ctx = CommandContext::new(&mut self.scene, &mut self.layers, selectable);
        let ids = self.history.undo(&mut ctx)?.map(Command::object_ids);
        self.after_history_step(ids, "Undo")
    }

    /// Re-apply the newest undone entry. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.cancel_interaction();
        let selectable = self.selectable();
        let mut ctx = CommandContext::new(&mut self.scene, &mut self.layers, selectable);
        let ids = self.history.redo(&mut ctx)?.map(Command::object_ids);
        self.after_history_step(ids, "Redo")
    }

    fn after_history_step(&mut self, ids: Option<Vec<ObjectId>>, step: &str) -> EditorResult<bool> {
        let Some(ids) = ids else {
            return Ok(false);
        };
        log::debug!("{} touched {} objects", step, ids.len());
        for id in ids {
            self.emit(EditorEvent::ObjectModified(id));
        }
        self.emit_selection();
        self.emit_history();
        self.emit(EditorEvent::RepaintRequested);
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Queries and snapshots

    /// Objects to paint on `page`, bottom to top, skipping hidden ones
    pub fn visible_objects(&self, page: u32) -> Vec<&SceneObject> {
        self.layers
            .visible_order()
            .into_iter()
            .filter_map(|id| self.scene.get(id))
            .filter(|object| object.page == page && object.visible)
            .collect()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            scene: self.scene.serialize(),
            layers: self.layers.clone(),
            mode: self.mode(),
            page: self.page,
            timestamp: current_time_secs(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    /// Replace the scene and layers with a snapshot. History starts empty.
    ///
    /// Layer membership is reconciled against the restored objects, so a
    /// damaged snapshot still yields at least one layer and every object in
    /// exactly one of them.
    pub fn restore(&mut self, snapshot: EditorSnapshot) -> EditorResult<()> {
        self.session = InteractionSession::Idle;
        self.scene.restore(snapshot.scene);
        self.layers = snapshot.layers;
        let live: Vec<ObjectId> = self.scene.ids().collect();
        let repaired = self.layers.reconcile(&live);
        if repaired > 0 {
            log::warn!("Snapshot layer membership repaired ({} ids)", repaired);
        }
        self.history.clear();
        self.page = snapshot.page.max(1);
        self.select_mode(snapshot.mode)?;
        let layer_ids: Vec<LayerId> = self.layers.layers().iter().map(|layer| layer.id).collect();
        for id in layer_ids {
            self.sync_layer_flags(id);
        }
        self.emit_history();
        self.emit(EditorEvent::RepaintRequested);
        Ok(())
    }
}

/// Shift `delta` so `bounds` moved by it stays inside `page`
fn clamped_delta(bounds: Rect, delta: Vec2, page: Rect) -> Vec2 {
    let clamp_axis = |delta: f32, min: f32, max: f32, lo: f32, hi: f32| {
        if max - min > hi - lo {
            delta
        } else {
            delta.clamp(lo - min, hi - max)
        }
    };
    vec2(
        clamp_axis(delta.x, bounds.min.x, bounds.max.x, page.min.x, page.max.x),
        clamp_axis(delta.y, bounds.min.y, bounds.max.y, page.min.y, page.max.y),
    )
}

/// Rect of `size` centered on `center`, pushed inside `bounds` where it fits
fn place_within(center: Pos2, size: Vec2, bounds: Rect) -> Rect {
    let rect = Rect::from_center_size(center, size);
    let mut offset = Vec2::ZERO;
    if rect.width() <= bounds.width() {
        offset.x = (bounds.min.x - rect.min.x).max(0.0) + (bounds.max.x - rect.max.x).min(0.0);
    }
    if rect.height() <= bounds.height() {
        offset.y = (bounds.min.y - rect.min.y).max(0.0) + (bounds.max.y - rect.max.y).min(0.0);
    }
    rect.translate(offset)
}
