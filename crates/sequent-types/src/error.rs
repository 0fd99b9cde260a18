//! Unified error code contract.
//!
//! Every public error type in the workspace implements [`ErrorCode`] so
//! callers can branch on stable machine-readable codes instead of matching
//! display strings, and so retry logic can consult recoverability without
//! knowing the concrete error type.
//!
//! # Code Convention
//!
//! | Rule | Example |
//! |------|---------|
//! | UPPER_SNAKE_CASE | `SEQUENT_DIED` |
//! | Prefixed by layer | `SEQUENT_`, `TREE_`, `QUEUE_` |
//! | Stable once published | changing a code is a breaking change |
//!
//! The [`assert_error_code`] and [`assert_error_codes`] helpers let each
//! crate's tests enforce the convention over all variants of an enum.

/// Machine-readable error code contract.
///
/// # Example
///
/// ```
/// use sequent_types::ErrorCode;
///
/// #[derive(Debug)]
/// enum LookupError {
///     Missing,
///     Busy,
/// }
///
/// impl ErrorCode for LookupError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::Missing => "LOOKUP_MISSING",
///             Self::Busy => "LOOKUP_BUSY",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::Busy)
///     }
/// }
///
/// assert_eq!(LookupError::Missing.code(), "LOOKUP_MISSING");
/// assert!(LookupError::Busy.is_recoverable());
/// ```
pub trait ErrorCode {
    /// Returns the stable machine-readable code for this error.
    fn code(&self) -> &'static str;

    /// Returns `true` when retrying the failed operation may succeed.
    ///
    /// Validation failures and terminal states are not recoverable;
    /// transient conditions are.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error's code follows the workspace convention.
///
/// Checks that the code is non-empty, UPPER_SNAKE_CASE, and carries the
/// expected layer prefix.
///
/// # Panics
///
/// Panics with a descriptive message when any check fails. Intended for
/// use in tests.
pub fn assert_error_code<E: ErrorCode>(error: &E, prefix: &str) {
    let code = error.code();
    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(prefix),
        "error code '{code}' is missing the '{prefix}' prefix"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' is not UPPER_SNAKE_CASE"
    );
}

/// Asserts the code convention over every variant of an error enum.
///
/// # Panics
///
/// Panics when any element fails [`assert_error_code`].
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], prefix: &str) {
    for error in errors {
        assert_error_code(error, prefix);
    }
}

fn is_upper_snake_case(code: &str) -> bool {
    !code.starts_with('_')
        && !code.ends_with('_')
        && !code.contains("__")
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
