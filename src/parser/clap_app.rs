//! `clap` backed parser.
//!
//! Registrations are recorded in a small arena and turned into a
//! `clap::Command` tree when parsing, so flags may keep arriving until the
//! model is finalized.

use std::collections::HashMap;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::error::ModelError;
use crate::types::ValueKind;

use super::{Application, ArgId, CommandId, FlagId, ParamSpec, ParseContext};

#[derive(Debug, Clone)]
struct ClapNode {
    name: String,
    help: String,
    parent: Option<CommandId>,
    flags: Vec<FlagId>,
    args: Vec<ArgId>,
}

/// Values and trail extracted from `clap` matches.
#[derive(Debug, Clone, Default)]
pub struct ClapContext {
    commands: Vec<CommandId>,
    flags: HashMap<FlagId, String>,
    args: HashMap<ArgId, String>,
}

impl ParseContext for ClapContext {
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

#[derive(Debug, Clone)]
pub struct ClapApp {
    name: String,
    about: String,
    nodes: Vec<ClapNode>,
    app_flags: Vec<FlagId>,
    app_args: Vec<ArgId>,
    flag_specs: Vec<ParamSpec>,
    arg_specs: Vec<ParamSpec>,
}

impl ClapApp {
    pub fn new(name: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: about.into(),
            nodes: Vec::new(),
            app_flags: Vec::new(),
            app_args: Vec::new(),
            flag_specs: Vec::new(),
            arg_specs: Vec::new(),
        }
    }

    /// The `clap::Command` tree for everything registered so far.
    pub fn command_tree(&self) -> Command {
        self.build(None)
    }

    fn build(&self, at: Option<CommandId>) -> Command {
        let (mut cmd, flags, args) = match at {
            None => (
                Command::new(self.name.clone()).about(self.about.clone()),
                &self.app_flags,
                &self.app_args,
            ),
            Some(id) => {
                let node = &self.nodes[id.index()];
                (
                    Command::new(node.name.clone()).about(node.help.clone()),
                    &node.flags,
                    &node.args,
                )
            }
        };

        for flag in flags {
            cmd = cmd.arg(clap_flag(&self.flag_specs[flag.index()]));
        }
        for arg in args {
            cmd = cmd.arg(clap_arg(&self.arg_specs[arg.index()]));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if node.parent == at {
                cmd = cmd.subcommand(self.build(Some(CommandId::new(index))));
            }
        }
        cmd
    }

    fn child(&self, parent: Option<CommandId>, name: &str) -> Option<CommandId> {
        self.nodes
            .iter()
            .position(|node| node.parent == parent && node.name == name)
            .map(CommandId::new)
    }

    fn collect(&self, at: Option<CommandId>, matches: &ArgMatches, ctx: &mut ClapContext) {
        let (flags, args) = match at {
            None => (&self.app_flags, &self.app_args),
            Some(id) => (&self.nodes[id.index()].flags, &self.nodes[id.index()].args),
        };
        for flag in flags {
            if let Some(value) = matched_value(matches, &self.flag_specs[flag.index()]) {
                ctx.flags.insert(*flag, value);
            }
        }
        for arg in args {
            if let Some(value) = matched_value(matches, &self.arg_specs[arg.index()]) {
                ctx.args.insert(*arg, value);
            }
        }
    }
}

fn with_common_options(mut arg: Arg, spec: &ParamSpec) -> Arg {
    arg = arg.help(spec.help.clone()).required(spec.options.required);
    if let Some(default) = &spec.options.default {
        arg = arg.default_value(default.clone());
    }
    if let Some(envar) = &spec.options.envar {
        arg = arg.env(envar.clone());
    }
    arg
}

fn with_value_parser(arg: Arg, spec: &ParamSpec) -> Arg {
    match (spec.value_kind, spec.options.set_value) {
        (ValueKind::Bool, _) => arg.value_parser(clap::value_parser!(bool)),
        (_, Some(setter)) => {
            arg.value_parser(move |raw: &str| setter(raw).map(|()| raw.to_string()))
        }
        (_, None) => arg,
    }
}

fn clap_flag(spec: &ParamSpec) -> Arg {
    let mut arg = Arg::new(spec.name.clone()).long(spec.name.clone());
    arg = match spec.value_kind {
        ValueKind::Bool => arg.action(ArgAction::SetTrue),
        _ => with_value_parser(arg.action(ArgAction::Set), spec),
    };
    if let Some(short) = spec.options.short {
        arg = arg.short(short);
    }
    if spec.options.hidden {
        arg = arg.hide(true);
    }
    with_common_options(arg, spec)
}

fn clap_arg(spec: &ParamSpec) -> Arg {
    let arg = with_value_parser(Arg::new(spec.name.clone()).action(ArgAction::Set), spec);
    with_common_options(arg, spec)
}

/// Value supplied on the command line, by environment, or by a declared
/// default. Implicit `clap` defaults (e.g. `false` for switches) are ignored.
fn matched_value(matches: &ArgMatches, spec: &ParamSpec) -> Option<String> {
    let name = spec.name.as_str();
    match matches.value_source(name) {
        None => return None,
        Some(ValueSource::DefaultValue) if spec.options.default.is_none() => return None,
        Some(_) => {}
    }
    match spec.value_kind {
        ValueKind::Bool => matches
            .try_get_one::<bool>(name)
            .ok()
            .flatten()
            .map(|b| b.to_string()),
        _ => matches.try_get_one::<String>(name).ok().flatten().cloned(),
    }
}

impl Application for ClapApp {
    type Context = ClapContext;

    fn command(&mut self, parent: Option<CommandId>, name: &str, help: &str) -> CommandId {
        let id = CommandId::new(self.nodes.len());
        self.nodes.push(ClapNode {
            name: name.to_string(),
            help: help.to_string(),
            parent,
            flags: Vec::new(),
            args: Vec::new(),
        });
        id
    }

    fn flag(&mut self, parent: Option<CommandId>, spec: &ParamSpec) -> FlagId {
        let id = FlagId::new(self.flag_specs.len());
        self.flag_specs.push(spec.clone());
        match parent {
            Some(parent) => self.nodes[parent.index()].flags.push(id),
            None => self.app_flags.push(id),
        }
        id
    }

    fn arg(&mut self, parent: Option<CommandId>, spec: &ParamSpec) -> ArgId {
        let id = ArgId::new(self.arg_specs.len());
        self.arg_specs.push(spec.clone());
        match parent {
            Some(parent) => self.nodes[parent.index()].args.push(id),
            None => self.app_args.push(id),
        }
        id
    }

    fn parse(&self, args: &[String]) -> Result<Self::Context, ModelError> {
        let argv = std::iter::once(self.name.clone()).chain(args.iter().cloned());
        let matches = self.command_tree().try_get_matches_from(argv)?;

        let mut ctx = ClapContext::default();
        self.collect(None, &matches, &mut ctx);

        let mut parent = None;
        let mut current = &matches;
        while let Some((name, sub)) = current.subcommand() {
            let Some(id) = self.child(parent, name) else {
                break;
            };
            ctx.commands.push(id);
            self.collect(Some(id), sub, &mut ctx);
            parent = Some(id);
            current = sub;
        }

        debug!(
            event = "Parse",
            phase = "Matched",
            commands = ctx.commands.len(),
            flags = ctx.flags.len(),
            args = ctx.args.len()
        );
        Ok(ctx)
    }
}
