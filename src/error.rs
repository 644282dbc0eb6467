use strum_macros::{AsRefStr, Display};
use thiserror::Error;

use crate::types::ValueKind;

/// The kind of entity a name collision happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Object,
    Action,
    Field,
    Parameter,
    Capture,
    List,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{kind} '{name}' already exists")]
    DuplicateKey { kind: EntityKind, name: String },

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("unknown field '{field}' on object '{object}'")]
    UnknownField { object: String, field: String },

    #[error("unknown object '{0}'")]
    UnknownObject(String),

    #[error("unknown list '{list}' on object '{object}'")]
    UnknownList { object: String, list: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("capture group {position} does not exist in '{pattern}' ({groups} groups)")]
    InvalidCapturePosition {
        position: usize,
        pattern: String,
        groups: usize,
    },

    #[error("list element '{element}' does not match '{pattern}'")]
    UnparsableListElement { element: String, pattern: String },

    #[error(
        "unable to {existing} AND {requested} '{object}' instance '{key}' at the same time, remove it from one of the two actions"
    )]
    ConflictingAction {
        object: String,
        key: String,
        existing: String,
        requested: String,
    },

    #[error("attribute '{attribute}' expects a {expected} value, got '{found}'")]
    KindMismatch {
        attribute: String,
        expected: ValueKind,
        found: String,
    },

    #[error("object '{0}' is keyless and cannot receive keys")]
    KeylessObject(String),

    #[error("action '{0}' is internal only and cannot be extended by plugins")]
    InternalAction(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl ModelError {
    pub(crate) fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        ModelError::DuplicateKey {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: impl Into<String>, err: regex::Error) -> Self {
        ModelError::InvalidPattern {
            pattern: pattern.into(),
            reason: err.to_string(),
        }
    }
}

impl From<clap::Error> for ModelError {
    fn from(err: clap::Error) -> Self {
        ModelError::Parse(err.to_string())
    }
}
