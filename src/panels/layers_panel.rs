use crate::PdfEditorApp;
use crate::layer::LayerId;

enum LayerAction {
    Add,
    Activate(LayerId),
    ToggleVisibility(LayerId),
    ToggleLock(LayerId),
    Rename(LayerId, String),
    Move(LayerId, usize),
    Delete(LayerId),
}

struct LayerRow {
    id: LayerId,
    index: usize,
    name: String,
    visible: bool,
    locked: bool,
    objects: usize,
}

pub fn layers_panel(app: &mut PdfEditorApp, ctx: &egui::Context) {
    let layers = app.editor().layers();
    let active = layers.active_id();
    let count = layers.len();
    let rows: Vec<LayerRow> = layers
        .layers()
        .iter()
        .enumerate()
        .map(|(index, layer)| LayerRow {
            id: layer.id,
            index,
            name: layer.name.clone(),
            visible: layer.visible,
            locked: layer.locked,
            objects: layer.objects.len(),
        })
        .collect();

    let mut actions = Vec::new();
    egui::SidePanel::right("layers_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Layers");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("➕").on_hover_text("New layer").clicked() {
                        actions.push(LayerAction::Add);
                    }
                });
            });
            ui.separator();

            // Topmost layer first
            for row in rows.iter().rev() {
                layer_row(ui, row, row.id == active, count, &mut actions);
            }
        });

    for action in actions {
        let editor = app.editor_mut();
        let result = match action {
            LayerAction::Add => {
                editor.add_layer(None);
                Ok(())
            }
            LayerAction::Activate(id) => editor.set_active_layer(id),
            LayerAction::ToggleVisibility(id) => editor.toggle_layer_visibility(id).map(drop),
            LayerAction::ToggleLock(id) => editor.toggle_layer_lock(id).map(drop),
            LayerAction::Rename(id, name) => editor.rename_layer(id, &name),
            LayerAction::Move(id, index) => editor.move_layer(id, index),
            LayerAction::Delete(id) => editor.delete_layer(id).map(drop),
        };
        app.handle("layer", result);
    }
}

fn layer_row(ui: &mut egui::Ui, row: &LayerRow, active: bool, count: usize, actions: &mut Vec<LayerAction>) {
    let rename_id = egui::Id::new(("layer_rename", row.id));
    ui.horizontal(|ui| {
        let eye = if row.visible { "👁" } else { "—" };
        if ui.small_button(eye).on_hover_text("Show / hide").clicked() {
            actions.push(LayerAction::ToggleVisibility(row.id));
        }
        let lock = if row.locked { "🔒" } else { "🔓" };
        if ui.small_button(lock).on_hover_text("Lock / unlock").clicked() {
            actions.push(LayerAction::ToggleLock(row.id));
        }

        let editing: Option<String> = ui.data(|data| data.get_temp(rename_id));
        if let Some(mut name) = editing {
            let response = ui.text_edit_singleline(&mut name);
            if response.lost_focus() {
                ui.data_mut(|data| data.remove::<String>(rename_id));
                if !name.trim().is_empty() && name != row.name {
                    actions.push(LayerAction::Rename(row.id, name));
                }
            } else {
                response.request_focus();
                ui.data_mut(|data| data.insert_temp(rename_id, name));
            }
        } else {
            let label = format!("{} ({})", row.name, row.objects);
            let response = ui.selectable_label(active, label).on_hover_text("Double-click to rename");
            if response.double_clicked() {
                ui.data_mut(|data| data.insert_temp(rename_id, row.name.clone()));
            } else if response.clicked() {
                actions.push(LayerAction::Activate(row.id));
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.add_enabled(count > 1, egui::Button::new("🗑").small()).clicked() {
                actions.push(LayerAction::Delete(row.id));
            }
            if ui.add_enabled(row.index > 0, egui::Button::new("⬇").small()).clicked() {
                actions.push(LayerAction::Move(row.id, row.index - 1));
            }
            if ui.add_enabled(row.index + 1 < count, egui::Button::new("⬆").small()).clicked() {
                actions.push(LayerAction::Move(row.id, row.index + 1));
            }
        });
    });
}
