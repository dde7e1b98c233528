use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopyMoveError {
    #[error("image loading error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("{operation} not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CopyMoveError>;
