use std::sync::Arc;

use crate::config::EditorConfig;
use crate::document::{
    DocumentSession, DocumentWriter, FlattenedPngWriter, LoadPoll, MediaBoxRasterizer, PendingLoad, Raster,
};
use crate::element::ImageObject;
use crate::error::{EditorError, EditorResult};
use crate::event::{DocumentEvent, EditorEvent, EventQueue, LoggingHandler};
use crate::file_dialog::{self, FilePicker, PickKind};
use crate::file_handler::{DroppedPayload, FileHandler};
use crate::geometry::{Rotation, ViewTransform};
use crate::input::{InputHandler, route_event};
use crate::overlay;
use crate::panels::{self, ErrorBanner};
use crate::renderer::{PageView, Renderer};
use crate::state::{Editor, MemoryStore, StatePersistence};
use crate::tool::ToolMode;
use crate::util::time::current_time_secs;

/// Key of the preference document in eframe storage
const PREFERENCES_KEY: &str = "pdf_annotator_preferences";
/// Container width changes smaller than this do not refit the page
const REFIT_THRESHOLD: f32 = 0.5;

pub struct PdfEditorApp {
    editor: Editor,
    session: DocumentSession,
    renderer: Renderer,
    input: InputHandler,
    file_handler: FileHandler,
    picker: FilePicker,
    pending_load: Option<PendingLoad>,
    document_name: String,
    persistence: StatePersistence<MemoryStore>,
    events: EventQueue,
    banner: ErrorBanner,
    /// Keep the page fitted to the container width
    fit_width: bool,
    last_container_width: Option<f32>,
}

impl PdfEditorApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let stored = cc
            .storage
            .and_then(|storage| storage.get_string(PREFERENCES_KEY));
        Self::with_store(EditorConfig::default(), MemoryStore { data: stored })
    }

    pub fn with_store(config: EditorConfig, store: MemoryStore) -> Self {
        let persistence = StatePersistence::new(store, config.autosave_interval_secs);
        let preferences = persistence.load_preferences();
        let editor = Editor::new(config.clone(), preferences);
        let events = EventQueue::new();
        editor.subscribe(events.handler());
        editor.subscribe(Box::new(LoggingHandler));

        Self {
            editor,
            session: DocumentSession::new(config, Arc::new(MediaBoxRasterizer)),
            renderer: Renderer::new(),
            input: InputHandler::new(),
            file_handler: FileHandler::new(),
            picker: FilePicker::new(),
            pending_load: None,
            document_name: String::new(),
            persistence,
            events,
            banner: ErrorBanner::default(),
            fit_width: true,
            last_container_width: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    pub fn fit_width(&self) -> bool {
        self.fit_width
    }

    pub fn banner_mut(&mut self) -> &mut ErrorBanner {
        &mut self.banner
    }

    /// Log a failure and show its summary in the banner
    pub fn report(&mut self, operation: &str, err: &EditorError) {
        log::error!("{}: {}", operation, err);
        self.banner.show(err.user_message());
    }

    /// Unwrap `result`, reporting the error if there is one
    pub fn handle<T>(&mut self, operation: &str, result: EditorResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(operation, &err);
                None
            }
        }
    }

    // ---------------------------------------------------------------------
    // Document lifecycle

    pub fn open_dialog(&self, kind: PickKind) {
        self.picker.open(kind);
    }

    /// Start loading `bytes` in the background
    pub fn open_bytes(&mut self, name: &str, bytes: Vec<u8>) {
        self.editor.cancel_interaction();
        let result = self.session.begin_load(bytes, name);
        if let Some(pending) = self.handle("open", result) {
            self.pending_load = Some(pending);
        }
    }

    fn poll_load(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending_load.as_mut() else {
            return;
        };
        match pending.poll() {
            LoadPoll::Pending => ctx.request_repaint(),
            LoadPoll::Lost => {
                log::error!("Loader for {} went away", pending.name());
                self.pending_load = None;
                self.banner.show("This PDF could not be opened. It may be damaged.");
            }
            LoadPoll::Ready(result) => {
                let generation = pending.generation();
                let name = pending.name().to_owned();
                self.pending_load = None;
                let finished = self.session.finish_load(generation, result);
                if let Some(Some(loaded)) = self.handle("load", finished) {
                    self.document_name = name;
                    self.renderer.reset();
                    self.editor.reset_for_document(loaded.first_page.page_size);
                    self.editor.notify_document(DocumentEvent::Loaded {
                        page_count: loaded.page_count,
                    });
                    self.fit_width = true;
                    self.last_container_width = None;
                }
            }
        }
    }

    fn handle_files(&mut self, ctx: &egui::Context) {
        if let Some(file) = self.picker.take() {
            match file.kind {
                PickKind::Pdf => self.open_bytes(&file.name, file.bytes),
                PickKind::Image => match ImageObject::decode(&file.bytes, egui::Rect::NOTHING) {
                    Ok(image) => self.arm_image(&file.name, image),
                    Err(err) => {
                        log::error!("Failed to decode image {}: {}", file.name, err);
                        self.banner.show("That image could not be read.");
                    }
                },
            }
        }
        if !self.file_handler.check_for_dropped_files(ctx) {
            return;
        }
        for result in self.file_handler.process_dropped_files() {
            match result {
                Ok(DroppedPayload::Pdf { name, bytes }) => self.open_bytes(&name, bytes),
                Ok(DroppedPayload::Image { name, image }) => self.arm_image(&name, image),
                Err(err) => self.report("drop", &EditorError::Load(err)),
            }
        }
    }

    /// Make `image` the one the next click in image mode places
    fn arm_image(&mut self, name: &str, image: ImageObject) {
        log::info!("{} is ready to place", name);
        self.editor.set_pending_image(image);
        let result = self.editor.select_mode(ToolMode::Image);
        self.handle("select image tool", result);
    }

    // ---------------------------------------------------------------------
    // View

    pub fn go_to_page(&mut self, page: u32) {
        let result = self.session.go_to_page(page).and_then(|()| self.session.page_size(page));
        if let Some(size) = self.handle("go_to_page", result) {
            self.editor.set_page(page, size);
            self.editor.notify_document(DocumentEvent::PageChanged { page });
            self.last_container_width = None;
        }
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.fit_width = false;
        let result = self.session.set_scale(scale);
        if let Some(applied) = self.handle("set_scale", result) {
            self.view_changed(applied);
        }
    }

    pub fn zoom_by(&mut self, factor: f32) {
        let current = self.session.document().map_or(1.0, |document| document.scale());
        self.set_scale(current * factor);
    }

    pub fn set_fit_width(&mut self, fit: bool) {
        self.fit_width = fit;
        self.last_container_width = None;
    }

    pub fn rotate_clockwise(&mut self) {
        let Some(rotation) = self.session.document().map(|document| document.rotation().rotated_cw()) else {
            return;
        };
        let result = self.session.set_rotation(rotation);
        if self.handle("set_rotation", result).is_some() {
            self.editor.cancel_interaction();
            self.last_container_width = None;
            let scale = self.session.document().map_or(1.0, |document| document.scale());
            self.view_changed(scale);
        }
    }

    fn view_changed(&mut self, scale: f32) {
        self.editor.set_view_scale(scale);
        let rotation = self
            .session
            .document()
            .map_or(Rotation::R0, |document| document.rotation());
        self.editor.notify_document(DocumentEvent::ViewChanged {
            scale,
            rotation: rotation.degrees(),
        });
    }

    /// Refit when the container width changed or a refit was requested
    pub fn update_container_width(&mut self, width: f32) {
        if !self.fit_width || !self.session.is_loaded() {
            return;
        }
        let changed = self
            .last_container_width
            .is_none_or(|last| (last - width).abs() > REFIT_THRESHOLD);
        if !changed {
            return;
        }
        self.last_container_width = Some(width);
        let result = self.session.fit_to_width(width);
        if let Some(scale) = self.handle("fit_to_width", result) {
            self.view_changed(scale);
        }
    }

    /// Raster and transform of the page on screen
    pub fn current_view(&mut self, pixels_per_point: f32) -> Option<(Arc<Raster>, ViewTransform, u64)> {
        if !self.session.is_loaded() || self.is_loading() {
            return None;
        }
        let raster = self.session.current_page();
        let raster = self.handle("render", raster)?;
        let transform = self.session.view_transform(pixels_per_point);
        let transform = self.handle("view_transform", transform)?;
        Some((raster, transform, self.session.generation()))
    }

    /// Feed this frame's input to the editor and paint the page
    pub fn show_page(&mut self, ctx: &egui::Context, painter: &egui::Painter, view: &PageView<'_>, hovered: bool) {
        let (events, modifiers, time) = ctx.input(|i| (i.events.clone(), i.modifiers, i.time));
        let keyboard_taken = ctx.wants_keyboard_input();
        let events: Vec<egui::Event> = events
            .into_iter()
            .filter(|event| match event {
                egui::Event::PointerButton { pressed: true, .. } => hovered,
                egui::Event::Text(_) | egui::Event::Key { .. } => !keyboard_taken,
                _ => true,
            })
            .collect();

        for event in self.input.process_input(&events, modifiers, time, view) {
            let result = route_event(&event, &mut self.editor);
            self.handle("input", result);
        }
        if hovered {
            ctx.set_cursor_icon(self.editor.cursor());
        }
        self.renderer.render(painter, view, &self.editor);
    }

    // ---------------------------------------------------------------------
    // Export

    /// Flatten the current page with its annotations and hand it to the writer
    pub fn export_current_page(&mut self) {
        self.editor.cancel_interaction();
        let writer = FlattenedPngWriter;
        let result = self.flatten_current_page(&writer);
        let Some(bytes) = self.handle("export", result) else {
            return;
        };
        let name = file_dialog::export_file_name(&self.document_name, self.editor.page(), writer.extension());
        match file_dialog::save_export(&name, &bytes) {
            Ok(true) => self.editor.notify_document(DocumentEvent::Exported { bytes: bytes.len() }),
            Ok(false) => log::info!("Export cancelled"),
            Err(err) => {
                log::error!("export: {}", err);
                self.banner.show("Saving failed. Your annotations are still here.");
            }
        }
    }

    fn flatten_current_page(&mut self, writer: &dyn DocumentWriter) -> EditorResult<Vec<u8>> {
        let raster = self.session.current_page()?;
        let objects = self.editor.visible_objects(self.editor.page());
        let flattened = overlay::flatten(&raster, &objects)?;
        self.session.export(writer, Some(&flattened))
    }

    // ---------------------------------------------------------------------
    // Frame bookkeeping

    fn drain_events(&mut self, ctx: &egui::Context) {
        for event in self.events.drain() {
            match event {
                EditorEvent::Error(message) => self.banner.show(message),
                EditorEvent::RepaintRequested => ctx.request_repaint(),
                _ => {}
            }
        }
    }

    fn autosave(&mut self) {
        let now = current_time_secs();
        if let Err(err) = self.persistence.try_autosave(self.editor.preferences(), now) {
            log::warn!("Autosave failed: {}", err);
        }
    }
}

impl eframe::App for PdfEditorApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Err(err) = self.persistence.save_preferences(self.editor.preferences()) {
            log::warn!("Saving preferences failed: {}", err);
        }
        if let Some(json) = &self.persistence.store().data {
            storage.set_string(PREFERENCES_KEY, json.clone());
        }
    }

    fn auto_save_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.editor.config().autosave_interval_secs)
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_load(ctx);
        self.handle_files(ctx);

        panels::toolbar(self, ctx);
        self.banner.ui(ctx);
        panels::tools_panel(self, ctx);
        panels::layers_panel(self, ctx);
        panels::central_panel(self, ctx);
        panels::properties_panel(self, ctx);
        self.file_handler.preview_files_being_dropped(ctx);

        self.drain_events(ctx);
        self.autosave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Page /MediaBox [0 0 700 900] >> endobj\n%%EOF";

    fn loaded_app() -> PdfEditorApp {
        let mut app = PdfEditorApp::with_store(EditorConfig::default(), MemoryStore::default());
        let ctx = egui::Context::default();
        app.open_bytes("test.pdf", PDF.to_vec());
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while app.is_loading() && std::time::Instant::now() < deadline {
            app.poll_load(&ctx);
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        app
    }

    #[test]
    fn loading_resets_the_editor_and_fits_width() {
        let mut app = loaded_app();
        assert!(app.session().is_loaded());
        assert_eq!(app.document_name(), "test.pdf");
        assert_eq!(app.editor().page_bounds().size(), egui::vec2(700.0, 900.0));

        app.update_container_width(1000.0);
        let scale = app.session().document().map(|document| document.scale()).unwrap();
        assert!((scale - 980.0 / 700.0).abs() < 1e-4);
    }

    #[test]
    fn rejected_file_shows_banner_and_keeps_state() {
        let mut app = PdfEditorApp::with_store(EditorConfig::default(), MemoryStore::default());
        app.open_bytes("notes.txt", b"hello".to_vec());
        assert!(!app.is_loading());
        assert_eq!(app.banner_mut().message(), Some("Please choose a PDF file."));
    }

    #[test]
    fn out_of_range_page_is_reported() {
        let mut app = loaded_app();
        app.go_to_page(3);
        assert_eq!(app.editor().page(), 1);
        assert!(app.banner_mut().message().is_some());
    }

    #[test]
    fn preferences_come_from_the_store() {
        let store = MemoryStore {
            data: Some(r#"{ "stroke_width": 7.5 }"#.to_owned()),
        };
        let app = PdfEditorApp::with_store(EditorConfig::default(), store);
        assert_eq!(app.editor().preferences().stroke_width, 7.5);
    }
}
