//! Machine-readable error codes.
//!
//! Every error enum in the campus crates implements [`ErrorCode`] so that
//! transports and audit logs can report failures without matching on
//! display strings.
//!
//! # Example
//!
//! ```
//! use campus_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LookupError {
//!     Missing(String),
//!     Busy,
//! }
//!
//! impl ErrorCode for LookupError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing(_) => "LOOKUP_MISSING",
//!             Self::Busy => "LOOKUP_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! let err = LookupError::Busy;
//! assert_eq!(err.code(), "LOOKUP_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Stable, machine-readable classification of an error.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"CMD_NOT_FOUND"`
/// - **Prefixed by domain**: `AUTH_`, `CMD_`, `REGISTRY_`, `CONFIG_`, `SERVER_`
/// - **Stable**: codes appear in audit logs and must not change once shipped
///
/// # Recoverability
///
/// An error is recoverable when the caller can retry or correct the input
/// and expect a different outcome (a typo in a command name, a transient
/// socket failure). Authorization failures are never recoverable: retrying
/// with the same grants yields the same denial.
pub trait ErrorCode {
    /// Returns the machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying or correcting input may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code follows the naming conventions.
///
/// Intended for tests of error enums in downstream crates.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use campus_types::{assert_error_code, ErrorCode};
///
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "NET_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "NET_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Asserts [`assert_error_code`] for every error in `errors`.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
