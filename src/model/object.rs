use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{EntityKind, ModelError};
use crate::parser::{Application, CommandId};
use crate::store::ACTION_ATTR;
use crate::types::{Param, ValueKind};

use super::list::{ListBuilder, ObjectList};
use super::selection::{Selection, Target};
use super::{CliModel, CommandOwner};

/// A key or plain field declared on an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    help: String,
    kind: ValueKind,
    key: bool,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_key(&self) -> bool {
        self.key
    }
}

/// One action bound to one object, with its own sub-command.
#[derive(Debug, Clone)]
pub struct ObjectAction {
    pub(crate) name: String,
    pub(crate) object: String,
    pub(crate) action: String,
    pub(crate) cmd: CommandId,
    pub(crate) params: BTreeMap<String, Param>,
    pub(crate) plugins: Vec<String>,
}

impl ObjectAction {
    /// `{action}_{object}`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn command(&self) -> CommandId {
        self.cmd
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }
}

#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) name: String,
    pub(crate) desc: String,
    pub(crate) keyless: bool,
    pub(crate) keys: Vec<String>,
    pub(crate) field_order: Vec<String>,
    pub(crate) fields: BTreeMap<String, Field>,
    pub(crate) actions: BTreeMap<String, ObjectAction>,
    pub(crate) lists: BTreeMap<String, ObjectList>,
}

impl Object {
    pub(crate) fn new(name: &str, desc: &str, keyless: bool) -> Self {
        Object {
            name: name.to_string(),
            desc: desc.to_string(),
            keyless,
            keys: Vec::new(),
            field_order: Vec::new(),
            fields: BTreeMap::new(),
            actions: BTreeMap::new(),
            lists: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn is_keyless(&self) -> bool {
        self.keyless
    }

    /// Key field names, in declaration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Non-key field names, in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.field_order
    }

    /// Keys first, then the other fields.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.keys
            .iter()
            .chain(self.field_order.iter())
            .filter_map(|name| self.fields.get(name))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&ObjectAction> {
        self.actions.get(name)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ObjectAction> {
        self.actions.values()
    }

    pub fn list(&self, name: &str) -> Option<&ObjectList> {
        self.lists.get(name)
    }

    pub fn lists(&self) -> impl Iterator<Item = &ObjectList> {
        self.lists.values()
    }
}

/// Declares fields, actions and lists on one object.
pub struct ObjectBuilder<'a, A: Application> {
    pub(crate) model: &'a mut CliModel<A>,
    pub(crate) name: String,
}

impl<'a, A: Application> ObjectBuilder<'a, A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn object(&self) -> Result<&Object, ModelError> {
        self.model
            .objects
            .get(&self.name)
            .ok_or_else(|| ModelError::UnknownObject(self.name.clone()))
    }

    fn object_mut(&mut self) -> Result<&mut Object, ModelError> {
        self.model
            .objects
            .get_mut(&self.name)
            .ok_or_else(|| ModelError::UnknownObject(self.name.clone()))
    }

    /// Mark the object as having no key: list instances are keyed by the
    /// element text.
    pub fn no_fields(mut self) -> Result<Self, ModelError> {
        let object = self.object_mut()?;
        if !object.keys.is_empty() {
            return Err(ModelError::KeylessObject(object.name.clone()));
        }
        object.keyless = true;
        Ok(self)
    }

    pub fn add_key(self, kind: ValueKind, name: &str, help: &str) -> Result<Self, ModelError> {
        self.add_object_field(kind, name, help, true)
    }

    pub fn add_field(self, kind: ValueKind, name: &str, help: &str) -> Result<Self, ModelError> {
        self.add_object_field(kind, name, help, false)
    }

    fn add_object_field(
        mut self,
        kind: ValueKind,
        name: &str,
        help: &str,
        key: bool,
    ) -> Result<Self, ModelError> {
        let object = self.object_mut()?;
        if key && object.keyless {
            return Err(ModelError::KeylessObject(object.name.clone()));
        }
        if name == ACTION_ATTR || object.fields.contains_key(name) {
            return Err(ModelError::duplicate(EntityKind::Field, name));
        }
        object.fields.insert(
            name.to_string(),
            Field {
                name: name.to_string(),
                help: help.to_string(),
                kind,
                key,
            },
        );
        if key {
            object.keys.push(name.to_string());
        } else {
            object.field_order.push(name.to_string());
        }
        Ok(self)
    }

    /// Support the given top-level actions, each with its own sub-command
    /// under the action command.
    pub fn define_actions(mut self, actions: &[&str]) -> Result<Self, ModelError> {
        let object = self.object()?;
        let mut seen = BTreeSet::new();
        for action in actions {
            if !self.model.actions.contains_key(*action) {
                return Err(ModelError::UnknownAction(action.to_string()));
            }
            if object.actions.contains_key(*action) || !seen.insert(*action) {
                return Err(ModelError::duplicate(EntityKind::Action, *action));
            }
        }

        let desc = object.desc.clone();
        let model = &mut *self.model;
        for action in actions {
            let Some(generic) = model.actions.get(*action) else {
                return Err(ModelError::UnknownAction(action.to_string()));
            };
            let parent = generic.cmd;
            let help = generic.help_for(&desc);
            let cmd = model.app.command(Some(parent), &self.name, &help);
            model.commands.insert(
                cmd,
                CommandOwner::ObjectAction {
                    object: self.name.clone(),
                    action: action.to_string(),
                },
            );

            let object_action = ObjectAction {
                name: format!("{action}_{}", self.name),
                object: self.name.clone(),
                action: action.to_string(),
                cmd,
                params: BTreeMap::new(),
                plugins: Vec::new(),
            };
            debug!(
                event = "Model",
                phase = "DefineObjectAction",
                object = self.name,
                action = *action
            );
            if let Some(object) = model.objects.get_mut(&self.name) {
                object.actions.insert(action.to_string(), object_action);
            }
        }
        Ok(self)
    }

    /// Select object actions for the following parameter declarations.
    /// An empty slice selects all of them.
    pub fn on_actions(self, actions: &[&str]) -> Result<Selection<'a, A>, ModelError> {
        let object = self.object()?;
        let targets = if actions.is_empty() {
            object
                .actions
                .keys()
                .map(|action| Target::object_action(&self.name, action))
                .collect()
        } else {
            actions
                .iter()
                .map(|action| {
                    if object.actions.contains_key(*action) {
                        Ok(Target::object_action(&self.name, action))
                    } else {
                        Err(ModelError::UnknownAction(action.to_string()))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(Selection::new(self.model, targets))
    }

    pub fn on_all_actions(self) -> Result<Selection<'a, A>, ModelError> {
        self.on_actions(&[])
    }

    /// Declare a list decoding several instances of this object from one
    /// flag value.
    pub fn create_list(
        mut self,
        name: &str,
        separator: &str,
        selector: &str,
    ) -> Result<ListBuilder<'a, A>, ModelError> {
        let composed = self.model.captures.compose(selector);
        let list = ObjectList::new(&self.name, name, separator, composed)?;

        let object = self.object_mut()?;
        if object.lists.contains_key(name) {
            return Err(ModelError::duplicate(EntityKind::List, name));
        }
        object.lists.insert(name.to_string(), list);
        Ok(ListBuilder::new(self.model, self.name, name.to_string()))
    }

    /// Allow `plugins` to extend this object's `action`.
    pub fn allow_plugins(mut self, action: &str, plugins: &[&str]) -> Result<Self, ModelError> {
        let internal = self
            .model
            .actions
            .get(action)
            .map(|a| a.internal_only)
            .ok_or_else(|| ModelError::UnknownAction(action.to_string()))?;
        if internal {
            return Err(ModelError::InternalAction(action.to_string()));
        }

        let object = self.object_mut()?;
        let object_action = object
            .actions
            .get_mut(action)
            .ok_or_else(|| ModelError::UnknownAction(action.to_string()))?;
        for plugin in plugins {
            if !object_action.plugins.iter().any(|p| p == plugin) {
                object_action.plugins.push(plugin.to_string());
            }
        }
        Ok(self)
    }
}
