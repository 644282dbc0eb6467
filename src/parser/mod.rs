//! Boundary with the underlying argument parser.
//!
//! The model registers commands, flags and arguments through [`Application`]
//! and receives handles back. After parsing, a [`ParseContext`] yields the
//! trail of matched commands and the raw string supplied for any handle.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{ParamOptions, ValueKind};

mod clap_app;
mod mock;

pub use clap_app::{ClapApp, ClapContext};
pub use mock::{MockApp, MockContext};

/// Handle of a command registered on the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(usize);

/// Handle of a flag registered on the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlagId(usize);

/// Handle of a positional argument registered on the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArgId(usize);

macro_rules! impl_handle {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                pub fn new(index: usize) -> Self {
                    Self(index)
                }

                pub fn index(self) -> usize {
                    self.0
                }
            }
        )*
    };
}

impl_handle!(CommandId, FlagId, ArgId);

/// Everything the parser needs to register a flag or an argument.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub help: String,
    pub value_kind: ValueKind,
    pub options: ParamOptions,
}

/// Registration side of the parser.
///
/// `parent == None` registers at the application level.
pub trait Application {
    type Context: ParseContext;

    fn command(&mut self, parent: Option<CommandId>, name: &str, help: &str) -> CommandId;

    fn flag(&mut self, parent: Option<CommandId>, spec: &ParamSpec) -> FlagId;

    fn arg(&mut self, parent: Option<CommandId>, spec: &ParamSpec) -> ArgId;

    /// Parse raw process arguments, without the program name.
    fn parse(&self, args: &[String]) -> Result<Self::Context, ModelError>;
}

/// Result of one parse.
pub trait ParseContext {
    /// Matched commands, outermost first.
    fn selected_commands(&self) -> Vec<CommandId>;

    fn flag_value(&self, flag: FlagId) -> Option<String>;

    fn arg_value(&self, arg: ArgId) -> Option<String>;
}
