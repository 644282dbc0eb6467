//! Value types shared by the model, the parser boundary and the store.

mod context;
mod kind;
mod options;
mod param;
mod value;

pub use context::Context;
pub use kind::{ParamKind, ValueKind};
pub use options::{ParamOptions, ValueSetter};
pub(crate) use param::ParamSource;
pub use param::{DetailRef, ListRef, Param};
pub use value::Value;
