use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid page {0}")]
    InvalidPage(i64),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("not supported: {0}")]
    NotSupported(&'static str),

    #[error("unexpected end of stream in {0}")]
    EndOfStream(&'static str),

    #[error("resource locked: {0}")]
    ResourceLocked(String),
}
