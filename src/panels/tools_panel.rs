use crate::PdfEditorApp;
use crate::file_dialog::PickKind;
use crate::state::{FONT_SIZE_RANGE, STROKE_WIDTH_RANGE};
use crate::tool::{ShapeKind, ToolMode};

const TOOLS: [(ToolMode, &str); 7] = [
    (ToolMode::Cursor, "🖱 Select"),
    (ToolMode::Text, "🔤 Text"),
    (ToolMode::Draw, "✏ Draw"),
    (ToolMode::Highlight, "🖍 Highlight"),
    (ToolMode::Image, "🖼 Image"),
    (ToolMode::Stamp, "🔖 Stamp"),
    (ToolMode::Eraser, "🧽 Eraser"),
];

fn select(app: &mut PdfEditorApp, mode: ToolMode) {
    log::info!("Tool selected from UI: {}", mode.name());
    if mode == ToolMode::Image && !app.editor().has_pending_image() {
        app.open_dialog(PickKind::Image);
    }
    let result = app.editor_mut().select_mode(mode);
    app.handle("select_mode", result);
}

pub fn tools_panel(app: &mut PdfEditorApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(180.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Tools");
                let active = app.editor().mode();
                for (mode, label) in TOOLS {
                    if ui.selectable_label(active == mode, label).clicked() {
                        select(app, mode);
                    }
                }

                ui.label("Shapes");
                ui.horizontal_wrapped(|ui| {
                    for kind in ShapeKind::ALL {
                        let mode = ToolMode::Shape(kind);
                        if ui.selectable_label(active == mode, kind.name()).clicked() {
                            select(app, mode);
                        }
                    }
                });
                ui.separator();

                history_section(app, ui);
                ui.separator();
                defaults_section(app, ui);
            });
        });
}

fn history_section(app: &mut PdfEditorApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let history = app.editor().history();
        let (can_undo, can_redo) = (history.can_undo(), history.can_redo());

        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            let result = app.editor_mut().undo();
            app.handle("undo", result);
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            let result = app.editor_mut().redo();
            app.handle("redo", result);
        }
    });

    let history = app.editor().history();
    egui::CollapsingHeader::new(format!("History ({} / {})", history.undo_len(), history.redo_len()))
        .default_open(false)
        .show(ui, |ui| {
            egui::Grid::new("command_history_grid")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.strong("Undo");
                    ui.strong("Redo");
                    ui.end_row();

                    let undo: Vec<String> = history.undo_entries().rev().map(|entry| entry.command.label()).collect();
                    let redo: Vec<String> = history.redo_entries().rev().map(|entry| entry.command.label()).collect();
                    for i in 0..undo.len().max(redo.len()) {
                        ui.label(undo.get(i).map_or("", String::as_str));
                        ui.label(redo.get(i).map_or("", String::as_str));
                        ui.end_row();
                    }
                });
        });
}

/// Defaults applied to newly created objects
fn defaults_section(app: &mut PdfEditorApp, ui: &mut egui::Ui) {
    ui.heading("Defaults");
    let mut prefs = app.editor().preferences().clone();

    egui::Grid::new("defaults_grid").num_columns(2).show(ui, |ui| {
        ui.label("Stroke");
        ui.color_edit_button_srgba(&mut prefs.stroke_color);
        ui.end_row();

        ui.label("Width");
        ui.add(egui::DragValue::new(&mut prefs.stroke_width).range(STROKE_WIDTH_RANGE).speed(0.1));
        ui.end_row();

        ui.label("Fill");
        ui.horizontal(|ui| {
            let mut filled = prefs.fill_color.is_some();
            if ui.checkbox(&mut filled, "").changed() {
                prefs.fill_color = filled.then_some(egui::Color32::from_rgba_unmultiplied(59, 130, 246, 96));
            }
            if let Some(fill) = prefs.fill_color.as_mut() {
                ui.color_edit_button_srgba(fill);
            }
        });
        ui.end_row();

        ui.label("Text");
        ui.color_edit_button_srgba(&mut prefs.text_color);
        ui.end_row();

        ui.label("Font size");
        ui.add(egui::DragValue::new(&mut prefs.font_size).range(FONT_SIZE_RANGE));
        ui.end_row();

        ui.label("Highlight");
        ui.color_edit_button_srgba(&mut prefs.highlight_color);
        ui.end_row();

        ui.label("Grid");
        ui.horizontal(|ui| {
            ui.checkbox(&mut prefs.show_grid, "Show");
            ui.checkbox(&mut prefs.snap_to_grid, "Snap");
        });
        ui.end_row();
    });

    if &prefs != app.editor().preferences() {
        app.editor_mut().set_preferences(prefs);
    }
}
