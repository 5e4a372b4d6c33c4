use thiserror::Error;

use crate::export::ExportError;
use crate::sdk::SdkError;

/// Errors surfaced by the [`Editor`](crate::editor::Editor) facade.
///
/// `UnknownOperation` is a configuration error: the identifier was never listed in
/// `operations_order`, so the call site is wrong rather than the runtime state.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("operation `{0}` is not listed in operations_order")]
    UnknownOperation(String),

    #[error("no image has been loaded into the editor")]
    NotReady,

    #[error("image has no pixels")]
    EmptyImage,

    #[error("failed to resize image: {0}")]
    Resize(String),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
