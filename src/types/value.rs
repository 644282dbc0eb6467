//! Typed attribute values held by the value store.

use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

use super::kind::ValueKind;

/// A value decoded from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Bool(bool),
    List(Vec<String>),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => write!(f, "{}", items.iter().join(",")),
        }
    }
}

impl Value {
    /// Convert a raw parser string into a value of `kind`.
    ///
    /// `attribute` only serves the error message.
    pub fn parse(kind: ValueKind, attribute: &str, raw: &str) -> Result<Self, ModelError> {
        match kind {
            ValueKind::String => Ok(Value::String(raw.to_string())),
            ValueKind::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(ModelError::KindMismatch {
                        attribute: attribute.to_string(),
                        expected: kind,
                        found: raw.to_string(),
                    })
                }
            }
            ValueKind::List => Ok(Value::List(
                raw.split(',')
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}
