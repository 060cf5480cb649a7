//! Utility macros used internally by the crate.

/// Returns early with an error if a condition is not met.
///
/// Like `assert!`, but returns `Err($error)` instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(!headers.contains_key(CONTENT_LENGTH), HttpError::protocol("Content-Length header already present"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
