//! Error types for controller operations.

use thiserror::Error;

/// Errors that terminate the current event-handling call.
///
/// Selection ambiguity is never reported here; it is resolved by the
/// accept/force policy of the reconciler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ControllerError {
    /// The editable node is not attached to the document.
    #[error("missing editor node")]
    MissingEditorNode,

    /// A node the controller relies on is not an element of the expected kind.
    #[error("{0} is not an HTMLElement")]
    NotAnElement(&'static str),

    /// A DOM call failed while the controller needed it to succeed.
    #[error("DOM operation failed: {0}")]
    Dom(String),

    /// The rendering layer could not produce the editor contents.
    #[error("render failed: {0}")]
    Render(String),
}

impl From<&str> for ControllerError {
    fn from(s: &str) -> Self {
        ControllerError::Dom(s.to_string())
    }
}

impl From<String> for ControllerError {
    fn from(s: String) -> Self {
        ControllerError::Dom(s)
    }
}

/// Result alias used throughout the controller.
pub type Result<T, E = ControllerError> = std::result::Result<T, E>;
