use crate::PdfEditorApp;
use crate::file_dialog::PickKind;

const ZOOM_STEP: f32 = 1.25;

/// Document controls: open, page navigation, zoom, rotation, export
pub fn toolbar(app: &mut PdfEditorApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            let loading = app.is_loading();
            if ui.add_enabled(!loading, egui::Button::new("📂 Open PDF")).clicked() {
                app.open_dialog(PickKind::Pdf);
            }
            if loading {
                ui.spinner();
                ui.label("Loading…");
            }

            ui.separator();

            let document = app
                .session()
                .document()
                .map(|document| (document.current_page(), document.page_count(), document.scale()));
            ui.add_enabled_ui(document.is_some() && !loading, |ui| {
                let (page, page_count, scale) = document.unwrap_or((0, 0, 1.0));

                if ui.button("◀").clicked() && page > 1 {
                    app.go_to_page(page - 1);
                }
                if page_count > 0 {
                    ui.label(format!("{page} / {page_count}"));
                } else {
                    ui.label("– / –");
                }
                if ui.button("▶").clicked() && page < page_count {
                    app.go_to_page(page + 1);
                }

                ui.separator();

                if ui.button("−").on_hover_text("Zoom out").clicked() {
                    app.zoom_by(1.0 / ZOOM_STEP);
                }
                ui.label(format!("{:.0}%", scale * 100.0));
                if ui.button("+").on_hover_text("Zoom in").clicked() {
                    app.zoom_by(ZOOM_STEP);
                }
                let mut fit = app.fit_width();
                if ui.toggle_value(&mut fit, "Fit width").changed() {
                    app.set_fit_width(fit);
                }
                if ui.button("⟳").on_hover_text("Rotate clockwise").clicked() {
                    app.rotate_clockwise();
                }

                ui.separator();

                if ui.button("💾 Export page").clicked() {
                    app.export_current_page();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if !app.document_name().is_empty() {
                    ui.weak(app.document_name());
                }
            });
        });
    });
}
