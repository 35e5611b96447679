//! Server error types with HTTP status code mapping

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use ontotag::options::DebugPayloads;
use ontotag::OntologyError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Library error
    #[error("{0}")]
    Ontology(#[from] OntologyError),

    /// Request body is not the expected JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed multipart upload
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServerError::BadRequest(msg.into())
    }

    /// Errors from the use-case route. Nothing to query is a server failure
    /// there, and the candidate lists are only kept when exposed.
    pub fn from_query(err: OntologyError, debug: DebugPayloads) -> Self {
        match err {
            OntologyError::NotLoaded(msg) => ServerError::Internal(msg),
            OntologyError::NotFound {
                message,
                debug: payload,
            } => ServerError::Ontology(OntologyError::NotFound {
                message,
                debug: payload.filter(|_| debug.is_exposed()),
            }),
            other => ServerError::Ontology(other),
        }
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Ontology(OntologyError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            ServerError::Ontology(OntologyError::NotLoaded(_)) => StatusCode::BAD_REQUEST,
            ServerError::Ontology(OntologyError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ServerError::Ontology(OntologyError::Conflict(_)) => StatusCode::NOT_FOUND,
            ServerError::Ontology(OntologyError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Ontology(OntologyError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Json(_) | ServerError::Multipart(_) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Internal(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}: {:#}", status, self);
        }
        let debug = match &self {
            ServerError::Ontology(err) => err.debug().cloned(),
            _ => None,
        };
        let body = ErrorResponse {
            status: "error",
            message: self.to_string(),
            debug,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        let cases = [
            (OntologyError::bad_request("x"), StatusCode::BAD_REQUEST),
            (OntologyError::not_found("x"), StatusCode::NOT_FOUND),
            (OntologyError::Conflict("x".to_string()), StatusCode::NOT_FOUND),
            (OntologyError::NotLoaded("x".to_string()), StatusCode::BAD_REQUEST),
            (OntologyError::Timeout(Duration::from_millis(5)), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_query_errors() {
        let not_loaded = ServerError::from_query(OntologyError::NotLoaded("x".to_string()), DebugPayloads::Expose);
        assert_eq!(not_loaded.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let not_found = || OntologyError::NotFound {
            message: "missing".to_string(),
            debug: Some(json!({"mc_candidates": []})),
        };
        match ServerError::from_query(not_found(), DebugPayloads::Hide) {
            ServerError::Ontology(err) => assert!(err.debug().is_none()),
            other => panic!("unexpected {:?}", other),
        }
        match ServerError::from_query(not_found(), DebugPayloads::Expose) {
            ServerError::Ontology(err) => assert!(err.debug().is_some()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
