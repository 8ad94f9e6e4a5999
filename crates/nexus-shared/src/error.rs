use thiserror::Error;

/// Failure to parse one of the shared enums from its textual form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown role: {0}")]
    Role(String),

    #[error("Unknown post category: {0}")]
    Category(String),

    #[error("Unknown message kind: {0}")]
    MessageKind(String),

    #[error("Unknown severity: {0}")]
    Severity(String),
}
