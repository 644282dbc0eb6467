//! Optional parser configuration attached to a parameter.

/// Custom setter run by the parser on the raw value; an `Err` rejects it.
pub type ValueSetter = fn(&str) -> Result<(), String>;

/// Modifiers applied when a parameter is registered on the parser.
///
/// Every field is optional and `ParamOptions::default()` registers a plain,
/// optional parameter. Flags honour all modifiers; arguments ignore `short`
/// and `hidden`.
#[derive(Debug, Clone, Default)]
pub struct ParamOptions {
    pub required: bool,
    pub short: Option<char>,
    pub hidden: bool,
    pub default: Option<String>,
    pub envar: Option<String>,
    pub set_value: Option<ValueSetter>,
}

impl ParamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_envar(mut self, name: impl Into<String>) -> Self {
        self.envar = Some(name.into());
        self
    }

    pub fn with_set_value(mut self, setter: ValueSetter) -> Self {
        self.set_value = Some(setter);
        self
    }
}
