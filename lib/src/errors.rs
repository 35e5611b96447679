//! Error kinds surfaced by ontology queries and edits.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntologyError {
    /// Missing or invalid parameters
    #[error("{0}")]
    BadRequest(String),

    /// An identifier or entity could not be found in the graph
    #[error("{message}")]
    NotFound {
        message: String,
        debug: Option<Value>,
    },

    /// The graph does not hold what an edit expected, such as the triple to remove
    #[error("{0}")]
    Conflict(String),

    /// No ontology snapshot is published and none could be loaded
    #[error("{0}")]
    NotLoaded(String),

    /// The traversal ran past its wall-clock budget
    #[error("query exceeded its time budget of {0:?}")]
    Timeout(Duration),

    /// Loading, parsing or IO failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OntologyError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        OntologyError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        OntologyError::NotFound {
            message: msg.into(),
            debug: None,
        }
    }

    /// Candidate lists or other diagnostics attached to the error, if any.
    pub fn debug(&self) -> Option<&Value> {
        match self {
            OntologyError::NotFound { debug, .. } => debug.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OntologyError>;
