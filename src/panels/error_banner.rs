use egui::{Color32, RichText};

/// Dismissible strip at the top of the window showing the last error summary
#[derive(Debug, Default)]
pub struct ErrorBanner {
    message: Option<String>,
}

impl ErrorBanner {
    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn dismiss(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn ui(&mut self, ctx: &egui::Context) {
        let Some(message) = &self.message else {
            return;
        };
        let mut dismissed = false;
        egui::TopBottomPanel::top("error_banner")
            .frame(
                egui::Frame::side_top_panel(&ctx.style())
                    .fill(Color32::from_rgb(254, 226, 226))
                    .inner_margin(8.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(message).color(Color32::from_rgb(153, 27, 27)));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismissed = ui.button("✕").on_hover_text("Dismiss").clicked();
                    });
                });
            });
        if dismissed {
            self.dismiss();
        }
    }
}
