#[derive(Debug, thiserror::Error)]
pub enum ShellViewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Change monitoring unavailable: {0}")]
    Monitor(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ShellViewError>;
