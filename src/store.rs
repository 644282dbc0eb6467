//! Per-object, per-instance attribute records filled by context resolution.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::error::{EntityKind, ModelError};
use crate::types::Value;

/// Attribute holding the action that produced a record.
pub const ACTION_ATTR: &str = "action";

/// Attributes of one object instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    attrs: BTreeMap<String, Value>,
}

impl Record {
    fn new(action: &str) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(ACTION_ATTR.to_string(), Value::String(action.to_string()));
        Record { attrs }
    }

    pub fn action(&self) -> &str {
        self.attrs
            .get(ACTION_ATTR)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attrs.get(attr)
    }

    /// Set `attr`, refusing to change the kind of a value already held.
    pub fn set(&mut self, attr: &str, value: Value) -> Result<(), ModelError> {
        if attr == ACTION_ATTR {
            return Err(ModelError::duplicate(EntityKind::Field, ACTION_ATTR));
        }
        if let Some(existing) = self.attrs.get(attr)
            && existing.kind() != value.kind()
        {
            return Err(ModelError::KindMismatch {
                attribute: attr.to_string(),
                expected: existing.kind(),
                found: value.to_string(),
            });
        }
        self.attrs.insert(attr.to_string(), value);
        Ok(())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Records of one object, by instance key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Records {
    records: BTreeMap<String, Record>,
}

impl Records {
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueStore {
    objects: BTreeMap<String, Records>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `object`/`key`, created for `action` if missing.
    ///
    /// A record created by another action is a `ConflictingAction` error and
    /// is left untouched.
    pub fn record_mut(
        &mut self,
        object: &str,
        key: &str,
        action: &str,
    ) -> Result<&mut Record, ModelError> {
        let records = self.objects.entry(object.to_string()).or_default();
        let record = records.records.entry(key.to_string()).or_insert_with(|| {
            trace!(event = "Store", phase = "NewRecord", object, key, action);
            Record::new(action)
        });
        if record.action() != action {
            return Err(ModelError::ConflictingAction {
                object: object.to_string(),
                key: key.to_string(),
                existing: record.action().to_string(),
                requested: action.to_string(),
            });
        }
        Ok(record)
    }

    pub fn set(
        &mut self,
        object: &str,
        key: &str,
        action: &str,
        attr: &str,
        value: Value,
    ) -> Result<(), ModelError> {
        self.record_mut(object, key, action)?.set(attr, value)
    }

    /// Set `attr` on a record that already exists, whatever action created it.
    pub(crate) fn update(
        &mut self,
        object: &str,
        key: &str,
        attr: &str,
        value: Value,
    ) -> Result<bool, ModelError> {
        match self
            .objects
            .get_mut(object)
            .and_then(|records| records.records.get_mut(key))
        {
            Some(record) => record.set(attr, value).map(|()| true),
            None => Ok(false),
        }
    }

    pub fn get(&self, object: &str, key: &str, attr: &str) -> Option<&Value> {
        self.objects.get(object)?.get(key)?.get(attr)
    }

    pub fn get_string(&self, object: &str, key: &str, attr: &str) -> Option<&str> {
        self.get(object, key, attr).and_then(Value::as_str)
    }

    pub fn get_bool(&self, object: &str, key: &str, attr: &str) -> Option<bool> {
        self.get(object, key, attr).and_then(Value::as_bool)
    }

    pub fn get_list(&self, object: &str, key: &str, attr: &str) -> Option<&[String]> {
        self.get(object, key, attr).and_then(Value::as_list)
    }

    pub fn records(&self, object: &str) -> Option<&Records> {
        self.objects.get(object)
    }

    /// Instance keys recorded for `object`, sorted.
    pub fn instances(&self, object: &str) -> Vec<&str> {
        self.objects
            .get(object)
            .map(|records| records.keys().collect())
            .unwrap_or_default()
    }

    pub fn objects(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
