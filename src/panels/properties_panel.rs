//! Floating property editor.
//!
//! Reads every value from the current selection each frame and writes edits
//! back through [`crate::Editor::set_selection_property`], so the window and
//! the objects never disagree.

use egui::Color32;

use crate::PdfEditorApp;
use crate::element::text::FONT_FAMILIES;
use crate::element::{PropertyKey, PropertyValue};

const DEFAULT_FILL: Color32 = Color32::from_rgba_premultiplied(38, 65, 98, 96);

pub fn properties_panel(app: &mut PdfEditorApp, ctx: &egui::Context) {
    let selected = app.editor().scene().selection().len();
    if selected == 0 || app.editor().session().is_dragging() {
        return;
    }

    let mut edits: Vec<(PropertyKey, PropertyValue)> = Vec::new();
    egui::Window::new("Properties")
        .collapsible(true)
        .resizable(false)
        .default_pos(ctx.screen_rect().right_top() + egui::vec2(-460.0, 80.0))
        .show(ctx, |ui| {
            if selected > 1 {
                ui.weak(format!("{selected} objects selected"));
            }
            let editor = app.editor();
            let value = |key| editor.selection_property(key);
            egui::Grid::new("properties_grid").num_columns(2).show(ui, |ui| {
                color_row(ui, "Color", PropertyKey::Color, value(PropertyKey::Color), false, &mut edits);
                color_row(ui, "Fill", PropertyKey::Fill, value(PropertyKey::Fill), true, &mut edits);
                number_row(ui, "Stroke width", PropertyKey::StrokeWidth, value(PropertyKey::StrokeWidth), 0.5..=40.0, &mut edits);
                number_row(ui, "Opacity", PropertyKey::Opacity, value(PropertyKey::Opacity), 0.0..=1.0, &mut edits);
                font_row(ui, value(PropertyKey::FontFamily), &mut edits);
                number_row(ui, "Font size", PropertyKey::FontSize, value(PropertyKey::FontSize), 6.0..=144.0, &mut edits);
                bool_row(ui, "Bold", PropertyKey::Bold, value(PropertyKey::Bold), &mut edits);
                bool_row(ui, "Italic", PropertyKey::Italic, value(PropertyKey::Italic), &mut edits);
            });
            ui.separator();
            if ui.button("🗑 Delete").clicked() {
                edits.clear();
                let result = app.editor_mut().delete_selection().map(drop);
                app.handle("delete_selection", result);
            }
        });

    for (key, value) in edits {
        log::debug!("Property edit {} = {:?}", key.name(), value);
        let result = app.editor_mut().set_selection_property(key, value);
        app.handle("set_property", result);
    }
}

fn color_row(
    ui: &mut egui::Ui,
    label: &str,
    key: PropertyKey,
    value: Option<PropertyValue>,
    optional: bool,
    edits: &mut Vec<(PropertyKey, PropertyValue)>,
) {
    let Some(PropertyValue::Color(current)) = value else {
        return;
    };
    ui.label(label);
    ui.horizontal(|ui| {
        if optional {
            let mut enabled = current.is_some();
            if ui.checkbox(&mut enabled, "").changed() {
                edits.push((key, PropertyValue::Color(enabled.then_some(DEFAULT_FILL))));
            }
        }
        if let Some(mut color) = current {
            if ui.color_edit_button_srgba(&mut color).changed() {
                edits.push((key, PropertyValue::Color(Some(color))));
            }
        }
    });
    ui.end_row();
}

/// Slider whose value is only committed when the drag ends, so one drag is
/// one history entry
fn number_row(
    ui: &mut egui::Ui,
    label: &str,
    key: PropertyKey,
    value: Option<PropertyValue>,
    range: std::ops::RangeInclusive<f32>,
    edits: &mut Vec<(PropertyKey, PropertyValue)>,
) {
    let Some(PropertyValue::Number(current)) = value else {
        return;
    };
    let id = ui.id().with(key.name());
    let mut number = ui.data(|data| data.get_temp::<f32>(id)).unwrap_or(current);
    ui.label(label);
    let response = ui.add(egui::Slider::new(&mut number, range));
    if response.dragged() {
        ui.data_mut(|data| data.insert_temp(id, number));
    } else {
        ui.data_mut(|data| data.remove::<f32>(id));
    }
    if response.drag_stopped() || (response.changed() && !response.dragged()) {
        edits.push((key, PropertyValue::Number(number)));
    }
    ui.end_row();
}

fn bool_row(
    ui: &mut egui::Ui,
    label: &str,
    key: PropertyKey,
    value: Option<PropertyValue>,
    edits: &mut Vec<(PropertyKey, PropertyValue)>,
) {
    let Some(PropertyValue::Bool(mut on)) = value else {
        return;
    };
    ui.label(label);
    if ui.checkbox(&mut on, "").changed() {
        edits.push((key, PropertyValue::Bool(on)));
    }
    ui.end_row();
}

fn font_row(ui: &mut egui::Ui, value: Option<PropertyValue>, edits: &mut Vec<(PropertyKey, PropertyValue)>) {
    let Some(PropertyValue::Text(current)) = value else {
        return;
    };
    ui.label("Font");
    egui::ComboBox::from_id_salt("font_family")
        .selected_text(current.as_str())
        .show_ui(ui, |ui| {
            for family in FONT_FAMILIES {
                if ui.selectable_label(current == family, family).clicked() && current != family {
                    edits.push((PropertyKey::FontFamily, PropertyValue::Text(family.to_owned())));
                }
            }
        });
    ui.end_row();
}
