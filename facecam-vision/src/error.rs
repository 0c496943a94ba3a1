use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("malformed frame: {plane} plane holds {actual} bytes, needs at least {expected}")]
    MalformedFrame {
        plane: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed buffer: expected {expected} bytes, got {actual}")]
    MalformedBuffer { expected: usize, actual: usize },

    #[error("frame dimensions are zero")]
    ZeroDimensions,

    #[error("{plane} plane has an invalid stride for its size")]
    InvalidStride { plane: &'static str },

    #[error("rotation must be 0, 90, 180 or 270 degrees, got {0}")]
    InvalidRotation(i32),
}

pub type Result<T> = std::result::Result<T, FrameError>;
