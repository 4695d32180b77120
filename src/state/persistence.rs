use std::fs;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use egui::Color32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layer::LayerStack;
use crate::scene::SceneSnapshot;
use crate::tool::ToolMode;
use crate::util::time;

/// Errors that can occur during state persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to serialize state: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to write state: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("Failed to read state file: {0}")]
    ReadError(String),

    #[error("Invalid state data: {0}")]
    InvalidState(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Font sizes the defaults panel and stored preferences may hold
pub const FONT_SIZE_RANGE: RangeInclusive<f32> = 6.0..=144.0;
/// Stroke widths the defaults panel and stored preferences may hold
pub const STROKE_WIDTH_RANGE: RangeInclusive<f32> = 0.5..=40.0;

/// User defaults for new objects, stored as a flat JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: Color32,
    pub stroke_color: Color32,
    pub stroke_width: f32,
    pub fill_color: Option<Color32>,
    pub highlight_color: Color32,
    pub show_grid: bool,
    pub snap_to_grid: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            font_family: crate::element::text::DEFAULT_FONT_FAMILY.to_owned(),
            font_size: crate::element::text::DEFAULT_FONT_SIZE,
            text_color: Color32::BLACK,
            stroke_color: Color32::from_rgb(220, 38, 38),
            stroke_width: 2.0,
            fill_color: None,
            highlight_color: Color32::from_rgb(250, 204, 21),
            show_grid: false,
            snap_to_grid: false,
        }
    }
}

impl Preferences {
    /// Merge a stored document over the built-in defaults.
    ///
    /// Unknown keys are ignored and keys with a bad value keep their default.
    pub fn merge_json(json: &str) -> PersistenceResult<Self> {
        let stored: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(stored) = stored else {
            return Err(PersistenceError::InvalidState(
                "preferences must be a JSON object".to_owned(),
            ));
        };

        let serde_json::Value::Object(mut merged) = serde_json::to_value(Self::default())? else {
            return Err(PersistenceError::InvalidState("defaults are not an object".to_owned()));
        };
        for (key, value) in stored {
            if !merged.contains_key(&key) {
                log::warn!("Ignoring unknown preference '{}'", key);
                continue;
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            if serde_json::from_value::<Self>(serde_json::Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                log::warn!("Ignoring invalid value for preference '{}'", key);
            }
        }
        let merged: Self = serde_json::from_value(serde_json::Value::Object(merged))?;
        Ok(merged.clamped())
    }

    /// Pull numeric fields back into their usable ranges
    pub fn clamped(mut self) -> Self {
        self.font_size = self.font_size.clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end());
        self.stroke_width = self
            .stroke_width
            .clamp(*STROKE_WIDTH_RANGE.start(), *STROKE_WIDTH_RANGE.end());
        self
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialized editor state, used to restore a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub scene: SceneSnapshot,
    pub layers: LayerStack,
    pub mode: ToolMode,
    pub page: u32,
    /// When the snapshot was taken
    pub timestamp: f64,
    /// Version of the application when the snapshot was taken
    pub version: String,
}

impl EditorSnapshot {
    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Snapshot version {} differs from current version {}",
                snapshot.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        Ok(snapshot)
    }
}

/// Where preferences are kept between sessions
pub trait PreferenceStore {
    fn read(&self) -> PersistenceResult<Option<String>>;
    fn write(&mut self, json: &str) -> PersistenceResult<()>;
}

/// Preferences in a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FileStore {
    fn read(&self) -> PersistenceResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistenceError::ReadError(err.to_string())),
        }
    }

    fn write(&mut self, json: &str) -> PersistenceResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store, used on the web (eframe storage takes over) and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub data: Option<String>,
}

impl PreferenceStore for MemoryStore {
    fn read(&self) -> PersistenceResult<Option<String>> {
        Ok(self.data.clone())
    }

    fn write(&mut self, json: &str) -> PersistenceResult<()> {
        self.data = Some(json.to_owned());
        Ok(())
    }
}

/// Marks a save as in progress until dropped
#[derive(Debug)]
pub struct SaveGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Loads preferences and saves them on an interval
#[derive(Debug)]
pub struct StatePersistence<S: PreferenceStore> {
    store: S,
    autosave_interval: u64,
    last_autosave: f64,
    busy: Arc<AtomicBool>,
}

impl<S: PreferenceStore> StatePersistence<S> {
    pub fn new(store: S, autosave_interval: u64) -> Self {
        Self {
            store,
            autosave_interval,
            last_autosave: time::current_time_secs(),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored preferences merged over defaults; defaults if nothing usable is stored
    pub fn load_preferences(&self) -> Preferences {
        let stored = match self.store.read() {
            Ok(stored) => stored,
            Err(err) => {
                log::warn!("Could not read preferences: {}", err);
                None
            }
        };
        stored
            .map(|json| {
                Preferences::merge_json(&json).unwrap_or_else(|err| {
                    log::warn!("Stored preferences are invalid, using defaults: {}", err);
                    Preferences::default()
                })
            })
            .unwrap_or_default()
    }

    /// Claim the busy flag; `None` if a save is already running
    pub fn begin_save(&self) -> Option<SaveGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_saving(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn save_preferences(&mut self, preferences: &Preferences) -> PersistenceResult<bool> {
        let Some(_guard) = self.begin_save() else {
            log::debug!("Save already in progress, skipping");
            return Ok(false);
        };
        self.store.write(&preferences.to_json()?)?;
        self.last_autosave = time::current_time_secs();
        Ok(true)
    }

    /// Check if we should auto-save based on the interval
    pub fn should_autosave(&self, now: f64) -> bool {
        time::interval_elapsed(self.last_autosave, now, self.autosave_interval)
    }

    /// Save if the interval has passed and no save is running.
    /// Returns whether a save happened.
    pub fn try_autosave(&mut self, preferences: &Preferences, now: f64) -> PersistenceResult<bool> {
        if !self.should_autosave(now) {
            return Ok(false);
        }
        self.save_preferences(preferences)
    }
}
