#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod command;
pub mod config;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod file_dialog;
pub mod file_handler;
pub mod geometry;
pub mod input;
pub mod layer;
pub mod overlay;
pub mod panels;
pub mod renderer;
pub mod scene;
pub mod state;
pub mod texture_manager;
pub mod tool;
pub mod util;

pub use app::PdfEditorApp;
pub use command::{Command, CommandHistory};
pub use config::EditorConfig;
pub use document::{DocumentSession, DocumentWriter, FlattenedPngWriter, MediaBoxRasterizer, Raster, Rasterizer};
pub use element::{ObjectId, ObjectKind, ObjectStyle, PropertyKey, PropertyValue, SceneObject};
pub use error::{EditorError, EditorResult, ExportError, LoadError, RenderError};
pub use event::{EditorEvent, EventBus, EventQueue};
pub use geometry::{Rotation, ViewTransform};
pub use input::{InputEvent, InputHandler};
pub use layer::{Layer, LayerId, LayerStack};
pub use renderer::Renderer;
pub use scene::Scene;
pub use state::{Editor, InteractionSession};
pub use tool::{ShapeKind, ToolMode};
