//! Error handling module

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Why a refresh cycle failed. Any variant aborts the whole cycle.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RefreshError {
    /// Classify a reqwest failure, keeping timeouts distinct from other transport errors
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RefreshError::Timeout {
                url: url.to_string(),
            }
        } else {
            RefreshError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let resp = AppError::NotFound("aa:bb".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_malformed_message_names_url() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = RefreshError::Malformed {
            url: "http://pi.hole/api/dhcp/leases".to_string(),
            source,
        };
        assert!(err
            .to_string()
            .starts_with("Malformed response from http://pi.hole/api/dhcp/leases"));
    }
}
