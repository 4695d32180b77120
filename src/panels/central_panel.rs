use crate::PdfEditorApp;
use crate::renderer::PageView;

/// Empty space kept around the page
const PAGE_MARGIN: f32 = 10.0;

pub fn central_panel(app: &mut PdfEditorApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::central_panel(&ctx.style()).fill(egui::Color32::from_gray(60)))
        .show(ctx, |ui| {
            if app.is_loading() {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            if !app.session().is_loaded() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open or drop a PDF to start annotating");
                });
                return;
            }

            app.update_container_width(ui.available_width());
            let Some((raster, transform, generation)) = app.current_view(ctx.pixels_per_point()) else {
                return;
            };

            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .drag_to_scroll(false)
                .show(ui, |ui| {
                    let page_size = transform.display_size();
                    let available = ui.available_size();
                    let margin = egui::vec2(((available.x - page_size.x) / 2.0).max(PAGE_MARGIN), PAGE_MARGIN);
                    let (rect, response) =
                        ui.allocate_exact_size(page_size + margin * 2.0, egui::Sense::click_and_drag());
                    let view = PageView {
                        origin: rect.min + margin,
                        transform,
                        raster: &raster,
                        generation,
                    };
                    let hovered = response
                        .hover_pos()
                        .is_some_and(|pos| view.screen_rect().contains(pos));
                    let painter = ui.painter_at(rect);
                    app.show_page(ctx, &painter, &view, hovered);
                });
        });
}
