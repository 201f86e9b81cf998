//! Uniform result envelope returned across the engine boundary.
//!
//! The envelope carries a coarse [`StatusCode`] plus either data or a
//! message. It holds no transport concepts; the HTTP layer maps
//! [`StatusCode`] onto its own status codes.

use serde::{Serialize, Serializer};

use super::error::FeedResult;

/// Coarse outcome of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    NotFound,
    Conflict,
    BadRequest,
}

impl StatusCode {
    /// Numeric code, following the HTTP convention.
    pub fn as_u16(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::Conflict => 409,
        }
    }

    /// Whether this is [`StatusCode::Ok`].
    pub fn is_success(self) -> bool {
        self == StatusCode::Ok
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

/// Status plus data or message.
///
/// Exactly one of `data` and `message` is set: `data` on success, `message`
/// on failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    pub status_code: StatusCode,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Response<T> {
    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status_code: StatusCode::Ok,
            data: Some(data),
            message: None,
        }
    }

    /// Failed response carrying a human-readable message.
    pub fn failure(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }
}

impl<T> From<FeedResult<T>> for Response<T> {
    fn from(result: FeedResult<T>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(err) => Response::failure(err.status(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FeedError;

    #[test]
    fn test_ok_serialization() {
        let json = serde_json::to_value(Response::ok(vec!["a"])).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["data"][0], "a");
        assert!(json["message"].is_null());
    }

    #[test]
    fn test_from_error() {
        let result: FeedResult<()> = Err(FeedError::NotFoundId("Foo".into()));
        let response = Response::from(result);
        assert_eq!(response.status_code, StatusCode::NotFound);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("package Foo not found"));
        assert!(!response.is_success());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::Conflict.as_u16(), 409);
        assert!(!StatusCode::BadRequest.is_success());
    }
}
