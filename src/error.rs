use thiserror::Error;

use crate::command::CommandError;
use crate::element::{ObjectId, PropertyError};
use crate::layer::LayerId;
use crate::tool::TransitionError;

/// Errors raised by a [`crate::document::Rasterizer`] for a specific page or byte stream
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("malformed page data: {0}")]
    Malformed(String),
    #[error("document contains no pages")]
    NoPages,
    #[error("page {0} does not exist in the document")]
    MissingPage(u32),
    #[error("invalid raster dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Why a byte stream could not become a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("file is empty")]
    Empty,
    #[error("not a PDF file (missing %PDF- header)")]
    NotPdf,
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error(transparent)]
    Rasterizer(#[from] RenderError),
}

/// Failures while flattening the overlay or writing the output document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("no document is loaded")]
    NoDocument,
    #[error("could not allocate a {width}x{height} export surface")]
    Surface { width: u32, height: u32 },
    #[error("failed to encode output: {0}")]
    Encode(String),
    #[error("document writer failed: {0}")]
    Writer(String),
}

/// Top-level error taxonomy of the editor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("failed to load document: {0}")]
    Load(#[from] LoadError),

    #[error("page {requested} is out of range (document has {page_count} pages)")]
    PageIndex { requested: u32, page_count: u32 },

    #[error("failed to render page {page}: {source}")]
    Render {
        page: u32,
        #[source]
        source: RenderError,
    },

    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("unknown layer {0}")]
    UnknownLayer(LayerId),

    #[error("invalid property change: {0}")]
    Property(#[from] PropertyError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("history operation failed: {0}")]
    Command(#[from] CommandError),

    #[error("tool switch failed: {0}")]
    Transition(#[from] TransitionError),

    #[error("no document is loaded")]
    NoDocument,
}

impl EditorError {
    /// Short summary shown to the user instead of the raw internal error
    pub fn user_message(&self) -> String {
        match self {
            Self::Load(LoadError::NotPdf | LoadError::UnsupportedType(_)) => {
                "Please choose a PDF file.".to_owned()
            }
            Self::Load(_) => "This PDF could not be opened. It may be damaged.".to_owned(),
            Self::PageIndex { page_count, .. } => {
                format!("That page does not exist. Pick a page between 1 and {page_count}.")
            }
            Self::Render { page, .. } => format!("Page {page} could not be displayed."),
            Self::UnknownObject(_)
            | Self::UnknownLayer(_)
            | Self::Command(_)
            | Self::Transition(_) => {
                "Something went wrong while editing. Please try again.".to_owned()
            }
            Self::Property(_) => "That value cannot be applied to the selection.".to_owned(),
            Self::Export(_) => "Saving failed. Your annotations are still here.".to_owned(),
            Self::NoDocument => "Open a PDF first.".to_owned(),
        }
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
