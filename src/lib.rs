// src/lib.rs
pub use capture::CaptureRegistry;
pub use error::{EntityKind, ModelError};
pub use model::{
    Action, CliModel, Field, ListBuilder, Object, ObjectAction, ObjectBuilder, ObjectList,
    RefreshEntry, Selection, Target,
};
pub use store::{ACTION_ATTR, Record, Records, ValueStore};
pub use types::{
    Context, DetailRef, ListRef, Param, ParamKind, ParamOptions, Value, ValueKind, ValueSetter,
};

mod capture;
mod error;
mod model;
pub mod parser;
mod resolver;
mod store;
mod types;
