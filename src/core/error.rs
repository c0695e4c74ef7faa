// Error handling for the Licel reader

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LicelError>;

#[derive(Error, Debug)]
pub enum LicelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid file mask: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("format error: {0}")]
    Format(String),

    #[error("truncated data: expected {expected} bytes, {available} available")]
    TruncatedData { expected: usize, available: usize },
}
