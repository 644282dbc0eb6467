//! The command-line metamodel: actions, objects, lists and their parameters.
//!
//! Every declaration registers its commands and parameters on the
//! [`Application`] right away. Detail flags of propagated object lists are
//! added in a second pass, [`CliModel::finalize`], which [`CliModel::parse`]
//! runs on its own.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::capture::CaptureRegistry;
use crate::error::{EntityKind, ModelError};
use crate::parser::{Application, CommandId};
use crate::store::ValueStore;
use crate::types::{
    Context, DetailRef, Param, ParamKind, ParamOptions, ParamSource, ValueKind,
};

mod action;
mod list;
mod object;
mod selection;

#[cfg(test)]
mod tests;

pub use action::{Action, RefreshEntry};
pub use list::{ListBuilder, ObjectList};
pub use object::{Field, Object, ObjectAction, ObjectBuilder};
pub use selection::{Selection, Target};

/// What a registered command stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommandOwner {
    Action(String),
    ObjectAction { object: String, action: String },
}

/// Long option every parser command answers to on its own.
const HELP_NAME: &str = "help";
const HELP_SHORT: char = 'h';

/// Check that `name` and `short` are free among the parameters of one command.
pub(crate) fn check_param<'p>(
    params: impl IntoIterator<Item = &'p Param>,
    name: &str,
    short: Option<char>,
) -> Result<(), ModelError> {
    if name == HELP_NAME {
        return Err(ModelError::duplicate(EntityKind::Parameter, name));
    }
    if short == Some(HELP_SHORT) {
        return Err(ModelError::duplicate(
            EntityKind::Parameter,
            format!("-{HELP_SHORT}"),
        ));
    }
    for param in params {
        if param.name() == name {
            return Err(ModelError::duplicate(EntityKind::Parameter, name));
        }
        if let Some(short) = short
            && param.short() == Some(short)
        {
            return Err(ModelError::duplicate(
                EntityKind::Parameter,
                format!("-{short}"),
            ));
        }
    }
    Ok(())
}

pub struct CliModel<A: Application> {
    pub(crate) app: A,
    pub(crate) flags: BTreeMap<String, Param>,
    pub(crate) actions: BTreeMap<String, Action>,
    pub(crate) objects: BTreeMap<String, Object>,
    pub(crate) captures: CaptureRegistry,
    pub(crate) commands: HashMap<CommandId, CommandOwner>,
    pub(crate) context: Context,
    pub(crate) values: ValueStore,
}

impl<A: Application> CliModel<A> {
    pub fn new(app: A) -> Self {
        CliModel {
            app,
            flags: BTreeMap::new(),
            actions: BTreeMap::new(),
            objects: BTreeMap::new(),
            captures: CaptureRegistry::new(),
            commands: HashMap::new(),
            context: Context::default(),
            values: ValueStore::new(),
        }
    }

    /// Register a named regex fragment usable as `#name` in list selectors.
    pub fn add_field_list_capture(
        &mut self,
        name: &str,
        fragment: &str,
    ) -> Result<&mut Self, ModelError> {
        self.captures.register(name, fragment)?;
        Ok(self)
    }

    /// Add a flag at application level, loaded on every resolution.
    pub fn add_app_flag(
        &mut self,
        kind: ValueKind,
        name: &str,
        help: &str,
        options: ParamOptions,
    ) -> Result<&mut Self, ModelError> {
        check_param(self.flags.values(), name, options.short)?;
        let param = Param::bind(
            &mut self.app,
            None,
            ParamKind::Flag,
            kind,
            name,
            help,
            options,
            ParamSource::Plain,
        );
        self.flags.insert(name.to_string(), param);
        Ok(self)
    }

    /// Declare a top-level action.
    ///
    /// `compose_help` is the help of the action applied to an object, where
    /// `%s` is replaced by the object description. An `internal_only` action
    /// cannot be extended by plugins.
    pub fn define_action(
        &mut self,
        name: &str,
        help: &str,
        compose_help: &str,
        internal_only: bool,
    ) -> Result<&mut Self, ModelError> {
        if self.actions.contains_key(name) {
            return Err(ModelError::duplicate(EntityKind::Action, name));
        }
        let cmd = self.app.command(None, name, help);
        self.commands
            .insert(cmd, CommandOwner::Action(name.to_string()));
        self.actions.insert(
            name.to_string(),
            Action {
                name: name.to_string(),
                help: help.to_string(),
                compose_help: compose_help.to_string(),
                cmd,
                params: BTreeMap::new(),
                internal_only,
                to_refresh: Vec::new(),
            },
        );
        debug!(event = "Model", phase = "DefineAction", name, internal_only);
        Ok(self)
    }

    pub fn define_object(
        &mut self,
        name: &str,
        help: &str,
        keyless: bool,
    ) -> Result<ObjectBuilder<'_, A>, ModelError> {
        if self.objects.contains_key(name) {
            return Err(ModelError::duplicate(EntityKind::Object, name));
        }
        self.objects
            .insert(name.to_string(), Object::new(name, help, keyless));
        debug!(event = "Model", phase = "DefineObject", name, keyless);
        Ok(ObjectBuilder {
            model: self,
            name: name.to_string(),
        })
    }

    /// Builder for an object declared earlier.
    pub fn object(&mut self, name: &str) -> Result<ObjectBuilder<'_, A>, ModelError> {
        if !self.objects.contains_key(name) {
            return Err(ModelError::UnknownObject(name.to_string()));
        }
        Ok(ObjectBuilder {
            model: self,
            name: name.to_string(),
        })
    }

    /// Select top-level actions; an empty slice selects all of them.
    pub fn on_actions(&mut self, actions: &[&str]) -> Result<Selection<'_, A>, ModelError> {
        let targets = if actions.is_empty() {
            self.actions
                .keys()
                .map(|action| Target::action_only(action))
                .collect()
        } else {
            actions
                .iter()
                .map(|action| {
                    if self.actions.contains_key(*action) {
                        Ok(Target::action_only(action))
                    } else {
                        Err(ModelError::UnknownAction(action.to_string()))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(Selection::new(self, targets))
    }

    pub fn on_all_actions(&mut self) -> Result<Selection<'_, A>, ModelError> {
        self.on_actions(&[])
    }

    /// Add the detail flags of every pending refresh entry.
    ///
    /// For each field the propagated list does not bind, and that the source
    /// object action exposes as a plain parameter, the entry's target gets a
    /// `{object}-{field}` flag. Entries are processed once.
    pub fn finalize(&mut self) -> Result<(), ModelError> {
        let mut pending = Vec::new();
        for (name, action) in &self.actions {
            for (index, entry) in action.to_refresh.iter().enumerate() {
                if entry.materialized {
                    continue;
                }
                let details = self.detail_flags(entry)?;
                pending.push((name.clone(), index, entry.target.clone(), details));
            }
        }

        for (action, index, target, details) in pending {
            let cmd = self.target_cmd(&target)?;
            for (name, help, value_kind, detail) in details {
                if self.target_params(&target)?.contains_key(&name) {
                    continue;
                }
                let param = Param::bind(
                    &mut self.app,
                    Some(cmd),
                    ParamKind::Flag,
                    value_kind,
                    &name,
                    &help,
                    ParamOptions::default(),
                    ParamSource::Detail(detail),
                );
                debug!(
                    event = "Model",
                    phase = "Finalize",
                    target = target.to_string(),
                    flag = name
                );
                self.target_params_mut(&target)?.insert(name, param);
            }
            if let Some(entry) = self
                .actions
                .get_mut(&action)
                .and_then(|a| a.to_refresh.get_mut(index))
            {
                entry.materialized = true;
            }
        }
        Ok(())
    }

    fn detail_flags(
        &self,
        entry: &RefreshEntry,
    ) -> Result<Vec<(String, String, ValueKind, DetailRef)>, ModelError> {
        let object = self
            .objects
            .get(&entry.object)
            .ok_or_else(|| ModelError::UnknownObject(entry.object.clone()))?;
        let list = object.list(&entry.list).ok_or_else(|| ModelError::UnknownList {
            object: entry.object.clone(),
            list: entry.list.clone(),
        })?;
        let source = object
            .action(&entry.list_action)
            .ok_or_else(|| ModelError::UnknownAction(entry.list_action.clone()))?;

        Ok(object
            .all_fields()
            .filter(|field| !list.fields().values().any(|bound| bound == field.name()))
            .filter_map(|field| {
                let param = source.param(field.name())?;
                if param.is_list() || param.detail_ref().is_some() {
                    return None;
                }
                Some((
                    format!("{}-{}", object.name(), field.name()),
                    param.help().to_string(),
                    param.value_kind(),
                    DetailRef {
                        object: object.name().to_string(),
                        field: field.name().to_string(),
                    },
                ))
            })
            .collect())
    }

    pub(crate) fn target_cmd(&self, target: &Target) -> Result<CommandId, ModelError> {
        match target {
            Target::Action(action) => self
                .actions
                .get(action)
                .map(Action::command)
                .ok_or_else(|| ModelError::UnknownAction(action.clone())),
            Target::ObjectAction { object, action } => self
                .object_action(object, action)
                .map(ObjectAction::command),
        }
    }

    pub(crate) fn target_params(
        &self,
        target: &Target,
    ) -> Result<&BTreeMap<String, Param>, ModelError> {
        match target {
            Target::Action(action) => self
                .actions
                .get(action)
                .map(|a| &a.params)
                .ok_or_else(|| ModelError::UnknownAction(action.clone())),
            Target::ObjectAction { object, action } => {
                self.object_action(object, action).map(|oa| &oa.params)
            }
        }
    }

    pub(crate) fn target_params_mut(
        &mut self,
        target: &Target,
    ) -> Result<&mut BTreeMap<String, Param>, ModelError> {
        match target {
            Target::Action(action) => self
                .actions
                .get_mut(action)
                .map(|a| &mut a.params)
                .ok_or_else(|| ModelError::UnknownAction(action.clone())),
            Target::ObjectAction { object, action } => self
                .objects
                .get_mut(object)
                .ok_or_else(|| ModelError::UnknownObject(object.clone()))?
                .actions
                .get_mut(action)
                .map(|oa| &mut oa.params)
                .ok_or_else(|| ModelError::UnknownAction(action.clone())),
        }
    }

    fn object_action(&self, object: &str, action: &str) -> Result<&ObjectAction, ModelError> {
        self.objects
            .get(object)
            .ok_or_else(|| ModelError::UnknownObject(object.to_string()))?
            .action(action)
            .ok_or_else(|| ModelError::UnknownAction(action.to_string()))
    }

    /// The command the last resolution ended on.
    fn resolved_target(&self) -> Option<Target> {
        let action = self.context.action()?;
        Some(match self.context.object() {
            Some(object) if self.object_action(object, action).is_ok() => {
                Target::object_action(object, action)
            }
            _ => Target::action_only(action),
        })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn get_string(&self, object: &str, key: &str, field: &str) -> Option<&str> {
        self.values.get_string(object, key, field)
    }

    pub fn get_bool(&self, object: &str, key: &str, field: &str) -> Option<bool> {
        self.values.get_bool(object, key, field)
    }

    pub fn get_list(&self, object: &str, key: &str, field: &str) -> Option<&[String]> {
        self.values.get_list(object, key, field)
    }

    /// Instance keys resolved for `object`, sorted.
    pub fn instances(&self, object: &str) -> Vec<&str> {
        self.values.instances(object)
    }

    pub fn app_flag(&self, name: &str) -> Option<&Param> {
        self.flags.get(name)
    }

    pub fn get_app_string(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(Param::string_value)
    }

    pub fn get_app_bool(&self, name: &str) -> Option<bool> {
        self.flags.get(name).and_then(Param::bool_value)
    }

    /// Parameter of the resolved command, or of its top-level action.
    pub fn action_param(&self, name: &str) -> Option<&Param> {
        let target = self.resolved_target()?;
        self.target_params(&target)
            .ok()
            .and_then(|params| params.get(name))
            .or_else(|| self.actions.get(target.action())?.param(name))
    }

    pub fn get_action_string(&self, name: &str) -> Option<&str> {
        self.action_param(name).and_then(Param::string_value)
    }

    pub fn get_action_bool(&self, name: &str) -> Option<bool> {
        self.action_param(name).and_then(Param::bool_value)
    }

    pub fn get_object(&self, name: &str) -> Option<&Object> {
        self.objects.get(name)
    }

    pub fn get_action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn captures(&self) -> &CaptureRegistry {
        &self.captures
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    /// Access to the parser, e.g. to stage a [`MockApp`](crate::parser::MockApp) context.
    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }
}
