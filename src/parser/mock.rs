//! Scripted parser used by tests and by callers who drive the model without
//! a real command line.
//!
//! `MockApp` records every registration. Instead of parsing arguments, it
//! returns whatever trail and values were staged with
//! [`MockApp::set_context`] and [`MockApp::set_value`].

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::error::ModelError;

use super::{Application, ArgId, CommandId, FlagId, ParamSpec, ParseContext};

#[derive(Debug, Clone)]
struct MockCommand {
    name: String,
    help: String,
    commands: BTreeMap<String, CommandId>,
    flags: BTreeMap<String, FlagId>,
    args: BTreeMap<String, ArgId>,
}

/// The staged outcome of a mock parse.
#[derive(Debug, Clone, Default)]
pub struct MockContext {
    commands: Vec<CommandId>,
    flags: HashMap<FlagId, String>,
    args: HashMap<ArgId, String>,
}

impl ParseContext for MockContext {
    fn selected_commands(&self) -> Vec<CommandId> {
        self.commands.clone()
    }

    fn flag_value(&self, flag: FlagId) -> Option<String> {
        self.flags.get(&flag).cloned()
    }

    fn arg_value(&self, arg: ArgId) -> Option<String> {
        self.args.get(&arg).cloned()
    }
}

#[derive(Debug, Default)]
pub struct MockApp {
    name: String,
    commands: Vec<MockCommand>,
    root_commands: BTreeMap<String, CommandId>,
    app_flags: BTreeMap<String, FlagId>,
    app_args: BTreeMap<String, ArgId>,
    flag_specs: Vec<ParamSpec>,
    arg_specs: Vec<ParamSpec>,
    staged: MockContext,
}

impl MockApp {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage the matched command trail, dropping any previously staged values.
    pub fn set_context(&mut self, path: &[&str]) -> Result<&mut Self, ModelError> {
        let commands = self
            .walk(path)
            .ok_or_else(|| ModelError::Parse(format!("unknown command '{}'", path.join(" "))))?;
        self.staged = MockContext {
            commands,
            ..Default::default()
        };
        Ok(self)
    }

    /// Stage a value for a flag or argument of the innermost staged command,
    /// or of the application when no command is staged.
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<&mut Self, ModelError> {
        let cmd = self.staged.commands.last().copied();
        self.stage(cmd, name, value)
    }

    /// Stage a value for a flag or argument of the command at `path`, e.g. a
    /// flag of the action when the object command is the innermost one.
    pub fn set_value_at(
        &mut self,
        path: &[&str],
        name: &str,
        value: &str,
    ) -> Result<&mut Self, ModelError> {
        let cmd = self
            .find_command(path)
            .ok_or_else(|| ModelError::Parse(format!("unknown command '{}'", path.join(" "))))?;
        self.stage(Some(cmd), name, value)
    }

    fn stage(
        &mut self,
        cmd: Option<CommandId>,
        name: &str,
        value: &str,
    ) -> Result<&mut Self, ModelError> {
        let (flags, args) = match cmd {
            Some(cmd) => {
                let cmd = &self.commands[cmd.index()];
                (&cmd.flags, &cmd.args)
            }
            None => (&self.app_flags, &self.app_args),
        };

        if let Some(flag) = flags.get(name).copied() {
            trace!(event = "MockParse", name, value, "flag value staged");
            self.staged.flags.insert(flag, value.to_string());
            return Ok(self);
        }
        if let Some(arg) = args.get(name).copied() {
            trace!(event = "MockParse", name, value, "argument value staged");
            self.staged.args.insert(arg, value.to_string());
            return Ok(self);
        }
        Err(ModelError::Parse(format!(
            "unknown flag or argument '{name}'"
        )))
    }

    /// Stage a value for an application-level flag, whatever the trail.
    pub fn set_app_value(&mut self, name: &str, value: &str) -> Result<&mut Self, ModelError> {
        let flag = self
            .app_flags
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::Parse(format!("unknown application flag '{name}'")))?;
        self.staged.flags.insert(flag, value.to_string());
        Ok(self)
    }

    /// Find a command by its path from the application root.
    pub fn find_command(&self, path: &[&str]) -> Option<CommandId> {
        self.walk(path).and_then(|trail| trail.last().copied())
    }

    /// Flag registered on the command at `path` (application level when empty).
    pub fn get_flag(&self, path: &[&str], name: &str) -> Option<&ParamSpec> {
        let flags = match self.find_command(path) {
            Some(cmd) => &self.commands[cmd.index()].flags,
            None if path.is_empty() => &self.app_flags,
            None => return None,
        };
        flags.get(name).map(|flag| &self.flag_specs[flag.index()])
    }

    /// Argument registered on the command at `path` (application level when empty).
    pub fn get_arg(&self, path: &[&str], name: &str) -> Option<&ParamSpec> {
        let args = match self.find_command(path) {
            Some(cmd) => &self.commands[cmd.index()].args,
            None if path.is_empty() => &self.app_args,
            None => return None,
        };
        args.get(name).map(|arg| &self.arg_specs[arg.index()])
    }

    pub fn command_help(&self, path: &[&str]) -> Option<&str> {
        self.find_command(path)
            .map(|cmd| self.commands[cmd.index()].help.as_str())
    }

    /// Names of the sub-commands, flags and arguments under `path`.
    pub fn list_of(&self, path: &[&str]) -> Vec<String> {
        let Some(cmd) = self.find_command(path) else {
            return Vec::new();
        };
        let cmd = &self.commands[cmd.index()];
        cmd.commands
            .keys()
            .map(|name| format!("cmd:{name}"))
            .chain(cmd.flags.keys().map(|name| format!("flag:{name}")))
            .chain(cmd.args.keys().map(|name| format!("arg:{name}")))
            .collect()
    }

    fn walk(&self, path: &[&str]) -> Option<Vec<CommandId>> {
        let mut trail = Vec::with_capacity(path.len());
        let mut children = &self.root_commands;
        for name in path {
            let cmd = *children.get(*name)?;
            trail.push(cmd);
            children = &self.commands[cmd.index()].commands;
        }
        Some(trail)
    }
}

impl Application for MockApp {
    type Context = MockContext;

    fn command(&mut self, parent: Option<CommandId>, name: &str, help: &str) -> CommandId {
        let id = CommandId::new(self.commands.len());
        self.commands.push(MockCommand {
            name: name.to_string(),
            help: help.to_string(),
            commands: BTreeMap::new(),
            flags: BTreeMap::new(),
            args: BTreeMap::new(),
        });
        match parent {
            Some(parent) => self.commands[parent.index()].commands.insert(name.to_string(), id),
            None => self.root_commands.insert(name.to_string(), id),
        };
        id
    }

    fn flag(&mut self, parent: Option<CommandId>, spec: &ParamSpec) -> FlagId {
        let id = FlagId::new(self.flag_specs.len());
        self.flag_specs.push(spec.clone());
        match parent {
            Some(parent) => self.commands[parent.index()].flags.insert(spec.name.clone(), id),
            None => self.app_flags.insert(spec.name.clone(), id),
        };
        id
    }

    fn arg(&mut self, parent: Option<CommandId>, spec: &ParamSpec) -> ArgId {
        let id = ArgId::new(self.arg_specs.len());
        self.arg_specs.push(spec.clone());
        match parent {
            Some(parent) => self.commands[parent.index()].args.insert(spec.name.clone(), id),
            None => self.app_args.insert(spec.name.clone(), id),
        };
        id
    }

    fn parse(&self, _args: &[String]) -> Result<Self::Context, ModelError> {
        Ok(self.staged.clone())
    }
}
