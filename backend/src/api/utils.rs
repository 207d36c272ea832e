//! API utility functions
//!
//! Helpers shared by the handlers: path id parsing, body rejections and the
//! routing fallbacks.

use crate::error::AppError;
use axum::extract::{rejection::JsonRejection, Path};
use axum::http::StatusCode;

/// Parse a numeric path id
///
/// Anything that is not a plain decimal number is treated as an unknown
/// route, so `/api/invoices/abc` answers 404.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::RouteNotFound);
    }
    raw.parse().map_err(|_| AppError::RouteNotFound)
}

/// Report an unreadable JSON body as a client error
///
/// A body cut off by the size limit is reported as 413, not as malformed.
pub fn invalid_body(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(format!(
            "Request body too large: {}",
            rejection.body_text()
        ));
    }
    AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// Fallback for paths no route matches
pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

/// Fallback for known paths called with an unsupported method
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Method fallback for `/:id` routes
///
/// The id is checked first so a non-numeric id stays a 404 for every method.
pub async fn id_method_not_allowed(Path(id): Path<String>) -> AppError {
    match parse_id(&id) {
        Ok(_) => AppError::MethodNotAllowed,
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_digits() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("007").unwrap(), 7);
    }

    #[tokio::test]
    async fn test_id_fallback_checks_id_first() {
        assert!(matches!(
            id_method_not_allowed(Path("abc".to_string())).await,
            AppError::RouteNotFound
        ));
        assert!(matches!(
            id_method_not_allowed(Path("12".to_string())).await,
            AppError::MethodNotAllowed
        ));
    }

    #[test]
    fn test_parse_id_rejects_everything_else() {
        for raw in ["", "-1", "abc", "1.5", " 1", "99999999999999999999999"] {
            assert!(
                matches!(parse_id(raw), Err(AppError::RouteNotFound)),
                "'{}' should not parse",
                raw
            );
        }
    }
}
