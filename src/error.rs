use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NoRoute,
    NotFound,
    Config,
    Remote,
    Transport,
    Provider,
    Format,
    Unexpected,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            1 => ErrorKind::Config,
            2 => ErrorKind::Remote,
            3 => ErrorKind::Transport,
            4 => ErrorKind::Provider,
            6 => ErrorKind::Format,
            101 => ErrorKind::Validation,
            102 => ErrorKind::NoRoute,
            103 => ErrorKind::NotFound,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Failures of the directions call itself, as opposed to a provider answer.
    pub fn is_route_unavailable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Format)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        store_error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        store_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        transport_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        format_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.kind() {
            ErrorKind::Transport | ErrorKind::Provider | ErrorKind::Format => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch route")
            }
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, self.message.as_str()),
            _ => match self.code {
                1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
                _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
            },
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn validation_error(message: impl Into<String>) -> Error {
    Error {
        code: 101,
        message: message.into(),
    }
}

pub fn no_route_error() -> Error {
    Error {
        code: 102,
        message: "no route found".into(),
    }
}

pub fn not_found_error() -> Error {
    Error {
        code: 103,
        message: "not found".into(),
    }
}

pub fn env_var_error(err: env::VarError) -> Error {
    tracing::error!("environment variable error: {}", err);

    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error {
        code: 1,
        message: message.into(),
    }
}

pub fn store_error<T: Debug>(err: T) -> Error {
    tracing::error!("marker store error: {:?}", err);

    Error {
        code: 2,
        message: "marker store error".into(),
    }
}

pub fn transport_error(err: reqwest::Error) -> Error {
    tracing::error!("directions transport error: {}", err);

    let message = if err.is_timeout() {
        "directions request timed out"
    } else {
        "directions request failed"
    };

    Error {
        code: 3,
        message: message.into(),
    }
}

pub fn upstream_status_error(status: u16) -> Error {
    Error {
        code: 3,
        message: format!("directions endpoint answered with status {}", status),
    }
}

pub fn provider_error(message: impl Into<String>) -> Error {
    Error {
        code: 4,
        message: message.into(),
    }
}

pub fn runtime_error() -> Error {
    Error {
        code: 5,
        message: "no async runtime available to fetch the route".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

pub fn format_error<T: Display>(detail: T) -> Error {
    Error {
        code: 6,
        message: format!("unexpected directions response: {}", detail),
    }
}

#[test]
fn error_kinds_follow_codes() {
    assert_eq!(validation_error("bad category").kind(), ErrorKind::Validation);
    assert_eq!(no_route_error().kind(), ErrorKind::NoRoute);
    assert_eq!(provider_error("quota").kind(), ErrorKind::Provider);
    assert_eq!(format_error("text/html").kind(), ErrorKind::Format);
    assert_eq!(upstream_status_error(502).kind(), ErrorKind::Transport);
    assert_eq!(store_error("down").kind(), ErrorKind::Remote);
    assert_eq!(unexpected_error().kind(), ErrorKind::Unexpected);

    assert!(format_error("text/html").is_route_unavailable());
    assert!(!provider_error("quota").is_route_unavailable());
    assert!(!no_route_error().is_route_unavailable());
}

#[test]
fn validation_errors_answer_bad_request() {
    let response = validation_error("start and end query params required").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = store_error("down").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = provider_error("quota").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
