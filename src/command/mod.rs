mod commands;
mod context;
mod history;

use thiserror::Error;

use crate::element::ObjectId;
use crate::layer::LayerId;

pub use commands::Command;
pub use context::CommandContext;
pub use history::{CommandHistory, HistoryEntry};

/// Result type for command operations
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur while applying or reverting a command.
///
/// A failed command leaves the scene and layers as they were before it ran.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("object {0} is not in the scene")]
    UnknownObject(ObjectId),
    #[error("object {0} is already in the scene")]
    DuplicateObject(ObjectId),
    #[error("layer {0} does not exist")]
    UnknownLayer(LayerId),
    #[error("the last layer cannot be removed")]
    LastLayer,
}
