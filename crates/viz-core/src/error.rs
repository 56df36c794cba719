use thiserror::Error;

/// Conditions the renderers recover from without failing a frame.
///
/// None of these propagate out of the public API: initialization reports a
/// `bool`, everything else degrades and logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("2D drawing context unavailable")]
    ContextUnavailable,
    #[error("off-screen buffer unavailable ({width}x{height})")]
    OffscreenUnavailable { width: u32, height: u32 },
    #[error("renderer has been disposed")]
    Disposed,
}
