//! The loaded PDF: bytes, page rasters, view state, and the seams to the
//! external rasterizer and writer.

mod loader;
mod rasterizer;
mod session;
mod writer;

pub use loader::{LoadPoll, PendingLoad};
pub use rasterizer::{DEFAULT_MEDIA_BOX, MediaBoxRasterizer, Raster, Rasterizer};
pub use session::{Document, DocumentSession, LoadedDocument, PreparedDocument, validate_pdf};
pub use writer::{DocumentWriter, FlattenedPngWriter};
