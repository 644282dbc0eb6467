use std::collections::BTreeMap;

use crate::parser::CommandId;
use crate::types::Param;

use super::selection::Target;

/// A list flag whose detail flags still have to be added to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshEntry {
    pub(crate) object: String,
    pub(crate) list: String,
    pub(crate) list_action: String,
    pub(crate) target: Target,
    pub(crate) materialized: bool,
}

impl RefreshEntry {
    /// The object whose list was propagated.
    pub fn object(&self) -> &str {
        &self.object
    }

    pub fn list(&self) -> &str {
        &self.list
    }

    /// The object action the detail flags are copied from.
    pub fn list_action(&self) -> &str {
        &self.list_action
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }
}

/// A verb usable alone (`create`) or on any object supporting it
/// (`create repo`).
#[derive(Debug, Clone)]
pub struct Action {
    pub(crate) name: String,
    pub(crate) help: String,
    /// Help of object sub-commands, `%s` stands for the object description.
    pub(crate) compose_help: String,
    pub(crate) cmd: CommandId,
    pub(crate) params: BTreeMap<String, Param>,
    pub(crate) internal_only: bool,
    pub(crate) to_refresh: Vec<RefreshEntry>,
}

impl Action {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn compose_help(&self) -> &str {
        &self.compose_help
    }

    /// Help for this action applied to an object described as `desc`.
    pub fn help_for(&self, desc: &str) -> String {
        self.compose_help.replace("%s", desc)
    }

    pub fn command(&self) -> CommandId {
        self.cmd
    }

    pub fn is_internal_only(&self) -> bool {
        self.internal_only
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    pub fn to_refresh(&self) -> &[RefreshEntry] {
        &self.to_refresh
    }
}
