//! Two-variant outcome type for SDK operations.
//!
//! [`ApiResult`] is what the response-facing surfaces of the SDK hand back:
//! exactly one of a success value or an error value, never both. It converts
//! losslessly to and from [`std::result::Result`] so callers can use `?` once
//! they have decided how to treat the error branch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a fallible SDK operation.
///
/// Serialized externally tagged, so a success looks like
/// `{"success": ...}` and a failure like `{"error": ...}`.
///
/// # Examples
///
/// ```
/// use ssokit_types::ApiResult;
///
/// let ok: ApiResult<u32, String> = ApiResult::Success(7);
/// assert!(ok.is_success());
/// assert_eq!(ok.into_result(), Ok(7));
///
/// let err: ApiResult<u32, String> = ApiResult::Error("boom".into());
/// assert_eq!(err.message().as_deref(), Some("boom"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[must_use = "an ApiResult may carry an error that should be handled"]
pub enum ApiResult<T, E> {
    /// The operation produced a value
    Success(T),
    /// The operation failed
    Error(E),
}

impl<T, E> ApiResult<T, E> {
    /// Whether this is the success variant
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether this is the error variant
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Take the success value, discarding any error
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    /// Take the error value, discarding any success
    pub fn error(self) -> Option<E> {
        match self {
            Self::Success(_) => None,
            Self::Error(error) => Some(error),
        }
    }

    /// Borrow both sides
    pub const fn as_ref(&self) -> ApiResult<&T, &E> {
        match self {
            Self::Success(value) => ApiResult::Success(value),
            Self::Error(error) => ApiResult::Error(error),
        }
    }

    /// Transform the success value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U, E> {
        match self {
            Self::Success(value) => ApiResult::Success(f(value)),
            Self::Error(error) => ApiResult::Error(error),
        }
    }

    /// Transform the error value
    pub fn map_err<F2, F: FnOnce(E) -> F2>(self, f: F) -> ApiResult<T, F2> {
        match self {
            Self::Success(value) => ApiResult::Success(value),
            Self::Error(error) => ApiResult::Error(f(error)),
        }
    }

    /// Chain another fallible step onto a success
    pub fn and_then<U, F: FnOnce(T) -> ApiResult<U, E>>(self, f: F) -> ApiResult<U, E> {
        match self {
            Self::Success(value) => f(value),
            Self::Error(error) => ApiResult::Error(error),
        }
    }

    /// Return the success value or a fallback
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Success(value) => value,
            Self::Error(_) => default,
        }
    }

    /// Convert into a standard library result
    ///
    /// # Errors
    ///
    /// Returns the error variant's value as `Err`.
    pub fn into_result(self) -> Result<T, E> {
        self.into()
    }
}

impl<T, E: fmt::Display> ApiResult<T, E> {
    /// Human-readable error message, if this is the error variant
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::Error(error) => Some(error.to_string()),
        }
    }
}

impl<T, E> From<Result<T, E>> for ApiResult<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Error(error),
        }
    }
}

impl<T, E> From<ApiResult<T, E>> for Result<T, E> {
    fn from(result: ApiResult<T, E>) -> Self {
        match result {
            ApiResult::Success(value) => Ok(value),
            ApiResult::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_variant() {
        let ok: ApiResult<i32, String> = ApiResult::Success(1);
        assert!(ok.is_success());
        assert!(!ok.is_error());
        assert_eq!(ok.clone().success(), Some(1));
        assert_eq!(ok.error(), None);

        let err: ApiResult<i32, String> = ApiResult::Error("nope".into());
        assert!(err.is_error());
        assert_eq!(err.clone().success(), None);
        assert_eq!(err.error().as_deref(), Some("nope"));
    }

    #[test]
    fn test_map_and_map_err() {
        let ok: ApiResult<i32, String> = ApiResult::Success(2);
        assert_eq!(ok.map(|v| v * 10), ApiResult::Success(20));

        let err: ApiResult<i32, String> = ApiResult::Error("bad".into());
        assert_eq!(err.map_err(|e| e.len()), ApiResult::Error(3));
    }

    #[test]
    fn test_and_then_short_circuits() {
        let err: ApiResult<i32, &str> = ApiResult::Error("first");
        let chained = err.and_then(|v| ApiResult::<i32, &str>::Success(v + 1));
        assert_eq!(chained, ApiResult::Error("first"));
    }

    #[test]
    fn test_std_result_conversions() {
        let from_ok: ApiResult<u8, String> = Ok(5).into();
        assert_eq!(from_ok, ApiResult::Success(5));

        let back: Result<u8, String> = ApiResult::Error("x".to_string()).into();
        assert_eq!(back, Err("x".to_string()));
    }

    #[test]
    fn test_message_uses_display() {
        let err: ApiResult<(), std::fmt::Error> = ApiResult::Error(std::fmt::Error);
        assert_eq!(
            err.message().as_deref(),
            Some("an error occurred when formatting an argument")
        );
        assert_eq!(ApiResult::<(), String>::Success(()).message(), None);
    }

    #[test]
    fn test_serde_shape() {
        let ok: ApiResult<u32, String> = ApiResult::Success(3);
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"success":3}"#);

        let err: ApiResult<u32, String> =
            serde_json::from_str(r#"{"error":"denied"}"#).unwrap();
        assert_eq!(err, ApiResult::Error("denied".to_string()));
    }
}
