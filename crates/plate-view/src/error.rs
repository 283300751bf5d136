use thiserror::Error;

/// Raised when view code asks for the live editor outside of an
/// [`EditorScope`](crate::EditorScope).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("no live editing context: `current_editor` must be called inside an `EditorScope`")]
    NoEditorScope,
}
