// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("response must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("Invalid {kind}: {value}")]
    InvalidMode { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
