use egui::Vec2;

use crate::editor::Features;

/// Lifecycle and change notifications broadcast by the editor facade.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The incoming image exceeds the configured caps and is about to be downsampled
    Resize {
        from: [u32; 2],
        to: [u32; 2],
    },
    Resized {
        dimensions: [u32; 2],
    },
    /// An image has been installed and the editor accepts renders
    Ready,
    OperationCreated {
        identifier: String,
    },
    OperationUpdated {
        identifier: String,
    },
    OperationRemoved {
        identifier: String,
    },
    HistoryChanged {
        len: usize,
    },
    ZoomChanged {
        zoom: f32,
    },
    OffsetChanged {
        offset: Vec2,
    },
    FeaturesChanged(Features),
    Rendered,
    /// The SDK failed to render; the message is shown to the user, the editor keeps running
    RenderError(String),
    Exported,
    ExportFailed(String),
}
