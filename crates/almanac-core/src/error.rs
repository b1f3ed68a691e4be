use thiserror::Error;

/// Errors shared by every almanac crate
#[derive(Error, Debug)]
pub enum CoreError {
    /// A stored or submitted label matched no variant of a closed enumeration.
    #[error("Unknown {kind} value: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
