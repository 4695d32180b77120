mod editor_state;
pub mod context;
mod persistence;

pub use context::Editor;
pub use editor_state::InteractionSession;
pub use persistence::{
    EditorSnapshot, FONT_SIZE_RANGE, FileStore, MemoryStore, PersistenceError, PersistenceResult, PreferenceStore,
    Preferences, STROKE_WIDTH_RANGE, SaveGuard, StatePersistence,
};
