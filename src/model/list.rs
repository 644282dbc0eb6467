use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::trace;

use crate::error::{EntityKind, ModelError};
use crate::parser::Application;
use crate::types::{ListRef, Param, Value};

use super::{CliModel, check_param};
use super::object::Object;

/// A list flag of an object, decoded into one record per element.
///
/// The flag value is split on `separator` and each element must fully match
/// the composed selector. Capture groups feed the fields bound with
/// [`ListBuilder::field`].
#[derive(Debug, Clone)]
pub struct ObjectList {
    name: String,
    object: String,
    separator: String,
    selector: String,
    pattern: Regex,
    fields: BTreeMap<usize, String>,
    actions: BTreeSet<String>,
}

/// One decoded list element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Instance {
    pub(crate) key: String,
    pub(crate) attrs: Vec<(String, Value)>,
}

impl ObjectList {
    pub(crate) fn new(
        object: &str,
        name: &str,
        separator: &str,
        selector: String,
    ) -> Result<Self, ModelError> {
        if separator.is_empty() {
            return Err(ModelError::InvalidPattern {
                pattern: selector,
                reason: format!("list '{name}' needs a non-empty separator"),
            });
        }
        let pattern = Regex::new(&format!("^(?:{selector})$"))
            .map_err(|e| ModelError::invalid_pattern(selector.as_str(), e))?;
        Ok(ObjectList {
            name: name.to_string(),
            object: object.to_string(),
            separator: separator.to_string(),
            selector,
            pattern,
            fields: BTreeMap::new(),
            actions: BTreeSet::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// The selector after capture composition.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Capture groups available for binding, not counting the whole match.
    pub fn groups(&self) -> usize {
        self.pattern.captures_len() - 1
    }

    /// Field bound to each capture position.
    pub fn fields(&self) -> &BTreeMap<usize, String> {
        &self.fields
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(String::as_str)
    }

    pub fn is_active_for(&self, action: &str) -> bool {
        self.actions.contains(action)
    }

    /// Split `raw` and decode each element into an instance of `object`.
    ///
    /// The instance key is the first bound key field with a non-empty
    /// capture. Keyless objects, and elements without a captured key, are
    /// keyed by the element text.
    pub(crate) fn decode(&self, object: &Object, raw: &str) -> Result<Vec<Instance>, ModelError> {
        let mut instances = Vec::new();
        for element in raw.split(self.separator.as_str()).filter(|e| !e.is_empty()) {
            let caps = self.pattern.captures(element).ok_or_else(|| {
                ModelError::UnparsableListElement {
                    element: element.to_string(),
                    pattern: self.selector.clone(),
                }
            })?;

            let mut key = None;
            let mut attrs = Vec::with_capacity(self.fields.len());
            for (position, name) in &self.fields {
                let Some(capture) = caps.get(*position).map(|m| m.as_str()) else {
                    continue;
                };
                if capture.is_empty() {
                    continue;
                }
                let field = object.field(name).ok_or_else(|| ModelError::UnknownField {
                    object: object.name().to_string(),
                    field: name.clone(),
                })?;
                if key.is_none() && field.is_key() && !object.is_keyless() {
                    key = Some(capture.to_string());
                }
                attrs.push((name.clone(), Value::parse(field.kind(), name, capture)?));
            }

            let key = key.unwrap_or_else(|| element.to_string());
            trace!(event = "List", phase = "Decode", list = self.name, element, key);
            instances.push(Instance { key, attrs });
        }
        Ok(instances)
    }
}

/// Binds capture positions and actions on a freshly created list.
pub struct ListBuilder<'a, A: Application> {
    model: &'a mut CliModel<A>,
    object: String,
    list: String,
}

impl<'a, A: Application> ListBuilder<'a, A> {
    pub(crate) fn new(model: &'a mut CliModel<A>, object: String, list: String) -> Self {
        ListBuilder {
            model,
            object,
            list,
        }
    }

    /// Feed capture group `position` into `field`.
    pub fn field(mut self, position: usize, field: &str) -> Result<Self, ModelError> {
        let object = self
            .model
            .objects
            .get_mut(&self.object)
            .ok_or_else(|| ModelError::UnknownObject(self.object.clone()))?;
        if !object.fields.contains_key(field) {
            return Err(ModelError::UnknownField {
                object: self.object.clone(),
                field: field.to_string(),
            });
        }
        let list = object
            .lists
            .get_mut(&self.list)
            .ok_or_else(|| ModelError::UnknownList {
                object: self.object.clone(),
                list: self.list.clone(),
            })?;
        if position == 0 || position > list.groups() {
            return Err(ModelError::InvalidCapturePosition {
                position,
                pattern: list.selector.clone(),
                groups: list.groups(),
            });
        }
        list.fields.insert(position, field.to_string());
        Ok(self)
    }

    /// Activate the list on these object actions, each receiving a list flag
    /// named after the plural of the object.
    pub fn add_actions(mut self, actions: &[&str]) -> Result<Self, ModelError> {
        let flag = format!("{}s", self.object);
        let model = &mut *self.model;
        let object = model
            .objects
            .get(&self.object)
            .ok_or_else(|| ModelError::UnknownObject(self.object.clone()))?;
        if !object.lists.contains_key(&self.list) {
            return Err(ModelError::UnknownList {
                object: self.object.clone(),
                list: self.list.clone(),
            });
        }

        let mut commands = Vec::with_capacity(actions.len());
        let mut seen = BTreeSet::new();
        for action in actions {
            if !seen.insert(*action) {
                return Err(ModelError::duplicate(EntityKind::Action, *action));
            }
            let object_action = object
                .actions
                .get(*action)
                .ok_or_else(|| ModelError::UnknownAction(action.to_string()))?;
            check_param(object_action.params.values(), &flag, None)?;
            commands.push((action.to_string(), object_action.cmd));
        }
        let desc = object.desc.clone();

        for (action, cmd) in commands {
            let param = Param::list_flag(
                &mut model.app,
                cmd,
                &flag,
                &format!("{action} one or more {desc}"),
                ListRef {
                    object: self.object.clone(),
                    list: self.list.clone(),
                    action: action.clone(),
                },
            );
            if let Some(object) = model.objects.get_mut(&self.object) {
                if let Some(object_action) = object.actions.get_mut(&action) {
                    object_action.params.insert(flag.clone(), param);
                }
                if let Some(list) = object.lists.get_mut(&self.list) {
                    list.actions.insert(action);
                }
            }
        }
        Ok(self)
    }
}
