//! Shared option types that replace boolean flag parameters in the Rust API.

use serde::{Deserialize, Serialize};

/// How use_case_3 picks the process nodes attached to a well.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessMatching {
    /// Any subject with an edge into the well counts as a process, in addition
    /// to subjects linked through the participation relation.
    #[default]
    Permissive,
    /// Only subjects linked through the participation relation count.
    Strict,
}

impl ProcessMatching {
    pub fn is_strict(self) -> bool {
        matches!(self, ProcessMatching::Strict)
    }
}

impl From<bool> for ProcessMatching {
    fn from(strict: bool) -> Self {
        if strict {
            ProcessMatching::Strict
        } else {
            ProcessMatching::Permissive
        }
    }
}

/// Whether error responses carry the candidate IRI lists that were tried.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugPayloads {
    Expose,
    #[default]
    Hide,
}

impl DebugPayloads {
    pub fn is_exposed(self) -> bool {
        matches!(self, DebugPayloads::Expose)
    }
}

impl From<bool> for DebugPayloads {
    fn from(value: bool) -> Self {
        if value {
            DebugPayloads::Expose
        } else {
            DebugPayloads::Hide
        }
    }
}

impl From<DebugPayloads> for bool {
    fn from(value: DebugPayloads) -> Self {
        value.is_exposed()
    }
}
