use crate::element::ObjectId;
use crate::layer::LayerId;
use crate::tool::ToolMode;

#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Added(LayerId),
    Removed(LayerId),
    VisibilityChanged { id: LayerId, visible: bool },
    LockChanged { id: LayerId, locked: bool },
    Renamed(LayerId),
    ActiveChanged(LayerId),
    Reordered { id: LayerId, new_index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    Loaded { page_count: u32 },
    PageChanged { page: u32 },
    ViewChanged { scale: f32, rotation: u16 },
    Exported { bytes: usize },
}

/// Notifications broadcast by the editor store to UI subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ToolChanged { old: ToolMode, new: ToolMode },
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    ObjectModified(ObjectId),
    SelectionChanged(Vec<ObjectId>),
    LayerChanged(LayerEvent),
    DocumentChanged(DocumentEvent),
    HistoryChanged { can_undo: bool, can_redo: bool },
    TextEditingStarted(ObjectId),
    /// The overlay needs to be painted again
    RepaintRequested,
    /// User-facing error summary
    Error(String),
}
