use thiserror::Error;

/// Text and date parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type TextResult<T> = std::result::Result<T, TextError>;
