//! Parameters: flags, arguments and list flags bound to a parser command.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::ModelError;
use crate::parser::{Application, ArgId, CommandId, FlagId, ParamSpec, ParseContext};

use super::kind::{ParamKind, ValueKind};
use super::options::ParamOptions;
use super::value::Value;

/// Where a list flag decodes its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRef {
    pub object: String,
    pub list: String,
    /// Action stamped on the records the list decodes.
    pub action: String,
}

/// Object field fed by a detail flag added for a refreshed object list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRef {
    pub object: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamSource {
    Plain,
    List(ListRef),
    Detail(DetailRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Flag(FlagId),
    Arg(ArgId),
}

#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    help: String,
    kind: ParamKind,
    value_kind: ValueKind,
    options: ParamOptions,
    binding: Binding,
    source: ParamSource,
    value: Option<String>,
}

impl Display for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} '{}' ({})", self.kind, self.name, self.value_kind)?;
        if let Some(value) = &self.value {
            write!(f, " = '{value}'")?;
        }
        Ok(())
    }
}

impl Param {
    /// Register a parameter of `kind` on `cmd` (or at application level).
    ///
    /// List flags are always registered as string flags.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn bind<A: Application>(
        app: &mut A,
        cmd: Option<CommandId>,
        kind: ParamKind,
        value_kind: ValueKind,
        name: &str,
        help: &str,
        options: ParamOptions,
        source: ParamSource,
    ) -> Self {
        let spec = ParamSpec {
            name: name.to_string(),
            help: help.to_string(),
            value_kind: match kind {
                ParamKind::ListFlag => ValueKind::String,
                _ => value_kind,
            },
            options,
        };
        let binding = match kind {
            ParamKind::Arg => Binding::Arg(app.arg(cmd, &spec)),
            ParamKind::Flag | ParamKind::ListFlag => Binding::Flag(app.flag(cmd, &spec)),
        };
        Param {
            name: spec.name,
            help: spec.help,
            kind,
            value_kind,
            options: spec.options,
            binding,
            source,
            value: None,
        }
    }

    pub(crate) fn list_flag<A: Application>(
        app: &mut A,
        cmd: CommandId,
        name: &str,
        help: &str,
        list: ListRef,
    ) -> Self {
        Param::bind(
            app,
            Some(cmd),
            ParamKind::ListFlag,
            ValueKind::List,
            name,
            help,
            ParamOptions::default(),
            ParamSource::List(list),
        )
    }

    /// Copy this parameter onto `cmd` as a plain flag.
    ///
    /// The copy keeps name, help, value kind and options; it never keeps the
    /// list source, so list flags become plain string flags.
    pub fn copy_to_flag<A: Application>(&self, app: &mut A, cmd: CommandId) -> Param {
        let value_kind = match self.kind {
            ParamKind::ListFlag => ValueKind::String,
            _ => self.value_kind,
        };
        Param::bind(
            app,
            Some(cmd),
            ParamKind::Flag,
            value_kind,
            &self.name,
            &self.help,
            self.options.clone(),
            ParamSource::Plain,
        )
    }

    /// Copy this parameter onto `cmd` as a positional argument.
    pub fn copy_to_arg<A: Application>(&self, app: &mut A, cmd: CommandId) -> Param {
        let value_kind = match self.kind {
            ParamKind::ListFlag => ValueKind::String,
            _ => self.value_kind,
        };
        Param::bind(
            app,
            Some(cmd),
            ParamKind::Arg,
            value_kind,
            &self.name,
            &self.help,
            self.options.clone(),
            ParamSource::Plain,
        )
    }

    /// Load the value supplied for this parameter by the last parse.
    pub fn load_from<C: ParseContext>(&mut self, ctx: &C) {
        self.value = match self.binding {
            Binding::Flag(flag) => ctx.flag_value(flag),
            Binding::Arg(arg) => ctx.arg_value(arg),
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn options(&self) -> &ParamOptions {
        &self.options
    }

    pub fn is_list(&self) -> bool {
        self.kind == ParamKind::ListFlag
    }

    pub fn list_ref(&self) -> Option<&ListRef> {
        match &self.source {
            ParamSource::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn detail_ref(&self) -> Option<&DetailRef> {
        match &self.source {
            ParamSource::Detail(detail) => Some(detail),
            _ => None,
        }
    }

    /// Short option the parser exposes; arguments never have one.
    pub fn short(&self) -> Option<char> {
        match self.kind {
            ParamKind::Arg => None,
            _ => self.options.short,
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
    }

    /// Raw string from the parser, if any.
    pub fn raw_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The loaded value converted to this parameter's kind.
    pub fn value(&self) -> Result<Option<Value>, ModelError> {
        self.value
            .as_deref()
            .map(|raw| Value::parse(self.value_kind, &self.name, raw))
            .transpose()
    }

    pub fn string_value(&self) -> Option<&str> {
        match self.value_kind {
            ValueKind::Bool => None,
            _ => self.raw_value(),
        }
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.value_kind {
            ValueKind::Bool => self.value().ok().flatten().and_then(|v| v.as_bool()),
            _ => None,
        }
    }
}
