use serde::{Deserialize, Serialize};

/// Tunables of the editor, passed explicitly into [`crate::Editor`] and
/// [`crate::DocumentSession`] at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo entries kept; the oldest are dropped first
    pub history_limit: usize,
    /// Horizontal space reserved around the page when fitting to width
    pub fit_padding: f32,
    /// Device pixel ratio is clamped into this range before sizing page rasters
    pub pixel_ratio_range: (f32, f32),
    /// Shapes smaller than this (in page units) are discarded on pointer-up
    pub min_shape_size: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Seconds between preference autosaves
    pub autosave_interval_secs: u64,
    /// Label used by the stamp tool
    pub default_stamp: String,
    /// Hit radius of the resize handles in display pixels
    pub handle_radius: f32,
    /// Spacing of the page grid in page units
    pub grid_spacing: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            fit_padding: 20.0,
            pixel_ratio_range: (2.0, 3.0),
            min_shape_size: 3.0,
            min_scale: 0.1,
            max_scale: 10.0,
            autosave_interval_secs: 30,
            default_stamp: "APPROVED".to_owned(),
            handle_radius: 6.0,
            grid_spacing: 10.0,
        }
    }
}

impl EditorConfig {
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn with_min_shape_size(mut self, size: f32) -> Self {
        self.min_shape_size = size.max(0.0);
        self
    }

    /// Clamp a zoom factor into the configured range
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            1.0
        }
    }
}
