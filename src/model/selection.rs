use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use tracing::debug;

use crate::error::{EntityKind, ModelError};
use crate::parser::Application;
use crate::types::{ListRef, Param, ParamKind, ParamOptions, ParamSource, ValueKind};

use super::{CliModel, check_param};
use super::action::RefreshEntry;

/// Command receiving parameters from a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Target {
    /// A top-level action used without object.
    Action(String),
    /// An action applied to an object.
    ObjectAction { object: String, action: String },
}

impl Target {
    pub fn action_only(action: &str) -> Self {
        Target::Action(action.to_string())
    }

    pub fn object_action(object: &str, action: &str) -> Self {
        Target::ObjectAction {
            object: object.to_string(),
            action: action.to_string(),
        }
    }

    /// The top-level action owning this target.
    pub fn action(&self) -> &str {
        match self {
            Target::Action(action) | Target::ObjectAction { action, .. } => action,
        }
    }

    pub fn object(&self) -> Option<&str> {
        match self {
            Target::Action(_) => None,
            Target::ObjectAction { object, .. } => Some(object),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Target::Action(action) => write!(f, "{action}"),
            Target::ObjectAction { object, action } => write!(f, "{action}_{object}"),
        }
    }
}

/// A parameter waiting to be registered on one target.
enum Pending {
    Bind {
        kind: ParamKind,
        value_kind: ValueKind,
        name: String,
        help: String,
        options: ParamOptions,
        source: ParamSource,
    },
    Copy(Param),
}

impl Pending {
    fn name(&self) -> &str {
        match self {
            Pending::Bind { name, .. } => name,
            Pending::Copy(param) => param.name(),
        }
    }

    fn short(&self) -> Option<char> {
        match self {
            Pending::Bind {
                kind: ParamKind::Arg,
                ..
            } => None,
            Pending::Bind { options, .. } => options.short,
            Pending::Copy(param) => param.options().short,
        }
    }
}

/// The set of commands the next parameter declarations apply to.
///
/// Obtained from [`CliModel::on_actions`] or
/// [`ObjectBuilder::on_actions`](super::ObjectBuilder::on_actions). Every
/// declaration is checked against all targets before anything is registered,
/// so a failing call leaves the model unchanged.
pub struct Selection<'a, A: Application> {
    model: &'a mut CliModel<A>,
    targets: Vec<Target>,
}

impl<'a, A: Application> Selection<'a, A> {
    pub(crate) fn new(model: &'a mut CliModel<A>, targets: Vec<Target>) -> Self {
        Selection { model, targets }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Add a flag on every target.
    pub fn add_flag(
        self,
        kind: ValueKind,
        name: &str,
        help: &str,
        options: ParamOptions,
    ) -> Result<Self, ModelError> {
        self.commit(|_, _| {
            Ok(vec![plain(ParamKind::Flag, kind, name, help, options.clone())])
        })
    }

    /// Add a positional argument on every target.
    pub fn add_arg(
        self,
        kind: ValueKind,
        name: &str,
        help: &str,
        options: ParamOptions,
    ) -> Result<Self, ModelError> {
        self.commit(|_, _| Ok(vec![plain(ParamKind::Arg, kind, name, help, options.clone())]))
    }

    /// Add a flag named after an object field, with the field's kind and help.
    pub fn add_field_flag(self, field: &str, options: ParamOptions) -> Result<Self, ModelError> {
        self.add_field_param(ParamKind::Flag, field, options)
    }

    pub fn add_field_arg(self, field: &str, options: ParamOptions) -> Result<Self, ModelError> {
        self.add_field_param(ParamKind::Arg, field, options)
    }

    fn add_field_param(
        self,
        kind: ParamKind,
        field: &str,
        options: ParamOptions,
    ) -> Result<Self, ModelError> {
        self.commit(|model, target| {
            let unknown = || ModelError::UnknownField {
                object: target.to_string(),
                field: field.to_string(),
            };
            let object = target
                .object()
                .and_then(|object| model.objects.get(object))
                .ok_or_else(unknown)?;
            let field = object.field(field).ok_or_else(unknown)?;
            Ok(vec![plain(
                kind,
                field.kind(),
                field.name(),
                field.help(),
                options.clone(),
            )])
        })
    }

    /// Copy every parameter of `object`'s `action` onto each target, always as
    /// a plain flag.
    pub fn add_flags_from_object_action(self, object: &str, action: &str) -> Result<Self, ModelError> {
        let source = self
            .model
            .objects
            .get(object)
            .ok_or_else(|| ModelError::UnknownObject(object.to_string()))?
            .action(action)
            .ok_or_else(|| ModelError::UnknownAction(action.to_string()))?
            .params()
            .cloned()
            .collect::<Vec<_>>();
        self.commit(|_, _| Ok(source.iter().cloned().map(Pending::Copy).collect()))
    }

    /// Add a `{object}s` list flag decoding `list` on each target. Detail
    /// flags for the fields the list leaves out follow at finalize time.
    pub fn add_flag_from_object_list_action(
        self,
        object: &str,
        list: &str,
        list_action: &str,
    ) -> Result<Self, ModelError> {
        let flag = format!("{object}s");
        self.propagate_list(object, list, &[(list_action, flag)])
    }

    /// Same as [`add_flag_from_object_list_action`](Self::add_flag_from_object_list_action)
    /// for several list actions, each flag named `{list_action}-{object}s`.
    pub fn add_flags_from_object_list_actions(
        self,
        object: &str,
        list: &str,
        list_actions: &[&str],
    ) -> Result<Self, ModelError> {
        let flags = list_actions
            .iter()
            .map(|action| (*action, format!("{action}-{object}s")))
            .collect::<Vec<_>>();
        self.propagate_list(object, list, &flags)
    }

    fn propagate_list(
        self,
        object: &str,
        list: &str,
        flags: &[(&str, String)],
    ) -> Result<Self, ModelError> {
        let source = self
            .model
            .objects
            .get(object)
            .ok_or_else(|| ModelError::UnknownObject(object.to_string()))?;
        if source.list(list).is_none() {
            return Err(ModelError::UnknownList {
                object: object.to_string(),
                list: list.to_string(),
            });
        }
        for (action, _) in flags {
            if source.action(action).is_none() {
                return Err(ModelError::UnknownAction(action.to_string()));
            }
        }
        let desc = source.desc().to_string();

        let mut selection = self.commit(|_, _| {
            Ok(flags
                .iter()
                .map(|(action, flag)| Pending::Bind {
                    kind: ParamKind::ListFlag,
                    value_kind: ValueKind::List,
                    name: flag.clone(),
                    help: format!("{action} one or more {desc}"),
                    options: ParamOptions::default(),
                    source: ParamSource::List(ListRef {
                        object: object.to_string(),
                        list: list.to_string(),
                        action: action.to_string(),
                    }),
                })
                .collect())
        })?;

        for target in &selection.targets {
            let Some(owner) = selection.model.actions.get_mut(target.action()) else {
                continue;
            };
            for (action, _) in flags {
                let entry = RefreshEntry {
                    object: object.to_string(),
                    list: list.to_string(),
                    list_action: action.to_string(),
                    target: target.clone(),
                    materialized: false,
                };
                if !owner.to_refresh.contains(&entry) {
                    owner.to_refresh.push(entry);
                }
            }
        }
        Ok(selection)
    }

    /// Validate the parameters `build` produces for every target, then
    /// register them all.
    fn commit<F>(mut self, build: F) -> Result<Self, ModelError>
    where
        F: Fn(&CliModel<A>, &Target) -> Result<Vec<Pending>, ModelError>,
    {
        let mut staged = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let pending = build(&*self.model, target)?;
            {
                let existing = self.model.target_params(target)?;
                let mut names = BTreeSet::new();
                let mut shorts = BTreeSet::new();
                for param in &pending {
                    check_param(existing.values(), param.name(), param.short())?;
                    if !names.insert(param.name()) {
                        return Err(ModelError::duplicate(EntityKind::Parameter, param.name()));
                    }
                    if let Some(short) = param.short()
                        && !shorts.insert(short)
                    {
                        return Err(ModelError::duplicate(
                            EntityKind::Parameter,
                            format!("-{short}"),
                        ));
                    }
                }
            }
            staged.push((target.clone(), self.model.target_cmd(target)?, pending));
        }

        for (target, cmd, pending) in staged {
            for item in pending {
                let param = match item {
                    Pending::Bind {
                        kind,
                        value_kind,
                        name,
                        help,
                        options,
                        source,
                    } => Param::bind(
                        &mut self.model.app,
                        Some(cmd),
                        kind,
                        value_kind,
                        &name,
                        &help,
                        options,
                        source,
                    ),
                    Pending::Copy(source) => source.copy_to_flag(&mut self.model.app, cmd),
                };
                debug!(
                    event = "Model",
                    phase = "AddParam",
                    target = target.to_string(),
                    param = param.to_string()
                );
                self.model
                    .target_params_mut(&target)?
                    .insert(param.name().to_string(), param);
            }
        }
        Ok(self)
    }
}

fn plain(
    kind: ParamKind,
    value_kind: ValueKind,
    name: &str,
    help: &str,
    options: ParamOptions,
) -> Pending {
    Pending::Bind {
        kind,
        value_kind,
        name: name.to_string(),
        help: help.to_string(),
        options,
        source: ParamSource::Plain,
    }
}
