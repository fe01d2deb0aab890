//! Rendering error types.

use lantern_ecs::{ComponentNotRegistered, Entity};

/// Errors that abort registration or a frame update.
///
/// These all indicate setup mistakes. Transient per-frame conditions such as
/// a backend declining to begin a frame are reported through
/// [`StatusCode`](crate::StatusCode) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// A backend with the same label is already registered.
    #[error("a rendering backend labelled `{0}` is already registered")]
    DuplicateLabel(String),
    /// A destination asks for a backend that was never registered.
    #[error("destination {destination} requests unknown rendering backend `{label}`")]
    UnknownBackendLabel { destination: Entity, label: String },
    /// Unregistration of a label that is not registered.
    #[error("no rendering backend labelled `{0}` is registered")]
    BackendNotFound(String),
    /// The world is missing one of the rendering component types.
    #[error(transparent)]
    Component(#[from] ComponentNotRegistered),
}
