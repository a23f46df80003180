use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoodError {
    #[error("unknown palette choice: {0}")]
    UnknownPalette(String),

    #[error("invalid hex color: {0}")]
    InvalidColor(String),
}
