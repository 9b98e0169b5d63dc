use thiserror::Error;

/// Errors that can occur while building or tessellating a path.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TessError {
    /// The interior polygon does not start with a sweep "start" vertex.
    /// Indicates self-intersecting or unsanitized input.
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("unsupported path command '{0}'")]
    UnsupportedCommand(char),

    /// `segment` counts the path segments read before the failure.
    #[error("path data parse error after {segment} segments: {message}")]
    Parse { segment: usize, message: String },

    #[error("path has no drawable subpaths")]
    EmptyPath,

    #[error("render error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
