//! Caller-visible errors of the sequent runtime.
//!
//! All variants implement [`ErrorCode`] with the `SEQUENT_` prefix.
//!
//! # Taxonomy
//!
//! | Variant | Class | When |
//! |---------|-------|------|
//! | [`UnknownMethod`](SequentError::UnknownMethod) | validation | name not in the method table |
//! | [`WrongArity`](SequentError::WrongArity) | validation | argument count mismatch |
//! | [`NotAssignable`](SequentError::NotAssignable) | validation | argument kind mismatch |
//! | [`Stopped`](SequentError::Stopped) | liveness | sequent known dead at enqueue time |
//! | [`Died`](SequentError::Died) | liveness | sequent died while a reply was pending |
//! | [`HandlerFailed`](SequentError::HandlerFailed) | domain | fallible handler returned its error side |
//!
//! Validation errors are reported before any mailbox interaction and the
//! sequent keeps running. Liveness errors mark the sequent as terminal for
//! the caller. `HandlerFailed` is an ordinary domain failure; the sequent
//! keeps running.

use crate::ParamKind;
use sequent_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by `call`/`cast` on a [`Sequent`](crate::Sequent).
///
/// # Example
///
/// ```
/// use sequent_core::{ParamKind, SequentError};
/// use sequent_types::ErrorCode;
///
/// let err = SequentError::WrongArity { need: 1, have: 0 };
/// assert_eq!(err.code(), "SEQUENT_WRONG_ARITY");
/// assert_eq!(
///     err.to_string(),
///     "wrong number of arguments: need 1, have 0"
/// );
///
/// let err = SequentError::NotAssignable {
///     index: 0,
///     got: ParamKind::String,
///     want: ParamKind::Bool,
/// };
/// assert_eq!(
///     err.to_string(),
///     "argument 0 of type string is not assignable to bool"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum SequentError {
    /// The sequent was already terminated when the request was made.
    ///
    /// Returned by `call` and `cast` once `running()` is false.
    #[error("sequent stopped")]
    Stopped,

    /// The sequent terminated while the caller was awaiting a reply.
    ///
    /// The request was enqueued but purged, or the handler crashed while
    /// processing it.
    #[error("sequent died")]
    Died,

    /// The method name is not present in the sequent's method table.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Wrong number of arguments for the resolved method.
    ///
    /// Counts exclude the implicit receiver on both sides.
    #[error("wrong number of arguments: need {need}, have {have}")]
    WrongArity {
        /// Number of parameters the method declares.
        need: usize,
        /// Number of arguments the caller supplied.
        have: usize,
    },

    /// An argument's kind does not match the declared parameter kind.
    #[error("argument {index} of type {got} is not assignable to {want}")]
    NotAssignable {
        /// Zero-based position of the offending argument.
        index: usize,
        /// Kind of the supplied value.
        got: ParamKind,
        /// Declared kind of the parameter.
        want: ParamKind,
    },

    /// A fallible handler completed with its error side.
    ///
    /// Only methods registered with `fallible_method` produce this; the
    /// sequent itself keeps running.
    #[error("handler failed: {0}")]
    HandlerFailed(String),
}

impl ErrorCode for SequentError {
    fn code(&self) -> &'static str {
        match self {
            Self::Stopped => "SEQUENT_STOPPED",
            Self::Died => "SEQUENT_DIED",
            Self::UnknownMethod(_) => "SEQUENT_UNKNOWN_METHOD",
            Self::WrongArity { .. } => "SEQUENT_WRONG_ARITY",
            Self::NotAssignable { .. } => "SEQUENT_NOT_ASSIGNABLE",
            Self::HandlerFailed(_) => "SEQUENT_HANDLER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Validation errors need a corrected request and the liveness
        // errors name a sequent that will never come back; only a domain
        // failure may succeed on retry.
        matches!(self, Self::HandlerFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequent_types::assert_error_codes;

    fn all_variants() -> Vec<SequentError> {
        vec![
            SequentError::Stopped,
            SequentError::Died,
            SequentError::UnknownMethod("x".into()),
            SequentError::WrongArity { need: 1, have: 0 },
            SequentError::NotAssignable {
                index: 0,
                got: ParamKind::String,
                want: ParamKind::Bool,
            },
            SequentError::HandlerFailed("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "SEQUENT_");
    }

    #[test]
    fn arity_message_embeds_counts() {
        let err = SequentError::WrongArity { need: 2, have: 5 };
        assert_eq!(err.to_string(), "wrong number of arguments: need 2, have 5");
    }

    #[test]
    fn assignability_message_embeds_kinds() {
        let err = SequentError::NotAssignable {
            index: 3,
            got: ParamKind::Array,
            want: ParamKind::Object,
        };
        assert_eq!(
            err.to_string(),
            "argument 3 of type array is not assignable to object"
        );
    }

    #[test]
    fn only_handler_failures_are_recoverable() {
        for err in all_variants() {
            let expected = matches!(err, SequentError::HandlerFailed(_));
            assert_eq!(err.is_recoverable(), expected, "{err}");
        }
    }
}
