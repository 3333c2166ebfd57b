use thiserror::Error;

/// Failures raised by the reference authoring functions.
///
/// Scanning never produces these: malformed syntax in note text is skipped,
/// while an invalid identifier handed to an authoring function is a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    #[error("Invalid page name: '{0}'")]
    InvalidPageName(String),
    #[error("Invalid block id: '{0}'")]
    InvalidBlockId(String),
    #[error("Invalid display text: '{0}'")]
    InvalidDisplayText(String),
}

pub type Result<T, E = RefError> = std::result::Result<T, E>;
