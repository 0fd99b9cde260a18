//! Tree layer errors.
//!
//! Tree-owned variants use the `TREE_` prefix; errors raised by the
//! hosted sequent pass through with their own `SEQUENT_` codes so callers
//! see the original classification.

use sequent_core::SequentError;
use sequent_types::ErrorCode;
use thiserror::Error;

/// Error returned by path-addressed dispatch on an object tree.
///
/// # Example
///
/// ```
/// use sequent_tree::TreeError;
/// use sequent_types::ErrorCode;
///
/// let err = TreeError::NoObject("/net/peers".into());
/// assert_eq!(err.code(), "TREE_NO_OBJECT");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum TreeError {
    /// No node exists at the given path.
    #[error("no object at path: {0}")]
    NoObject(String),

    /// The node exists but is a placeholder with no hosted sequent.
    #[error("no handler at path: {0}")]
    NoHandler(String),

    /// The path is empty or otherwise malformed.
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    /// The hosted sequent rejected or failed the request.
    #[error(transparent)]
    Sequent(#[from] SequentError),
}

impl ErrorCode for TreeError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoObject(_) => "TREE_NO_OBJECT",
            Self::NoHandler(_) => "TREE_NO_HANDLER",
            Self::InvalidPath(_) => "TREE_INVALID_PATH",
            Self::Sequent(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::NoObject(_) | Self::NoHandler(_) | Self::InvalidPath(_) => false,
            Self::Sequent(err) => err.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequent_types::assert_error_codes;

    #[test]
    fn tree_owned_codes_valid() {
        assert_error_codes(
            &[
                TreeError::NoObject("/a".into()),
                TreeError::NoHandler("/a".into()),
                TreeError::InvalidPath("".into()),
            ],
            "TREE_",
        );
    }

    #[test]
    fn sequent_errors_pass_through() {
        let err = TreeError::from(SequentError::Died);
        assert_eq!(err.code(), "SEQUENT_DIED");
        assert_eq!(err.to_string(), "sequent died");
        assert!(!err.is_recoverable());

        let err = TreeError::from(SequentError::HandlerFailed("x".into()));
        assert!(err.is_recoverable());
    }
}
