//! Outcome of one context resolution.

use serde::Serialize;

/// What the last parse invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Context {
    action: Option<String>,
    object: Option<String>,
    list: Option<String>,
    trail: Vec<String>,
    resolved: bool,
}

impl Context {
    pub(crate) fn resolved(
        action: Option<String>,
        object: Option<String>,
        list: Option<String>,
        trail: Vec<String>,
    ) -> Self {
        Context {
            action,
            object,
            list,
            trail,
            resolved: true,
        }
    }

    /// Resolved action; `None` only when no command matched.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn list(&self) -> Option<&str> {
        self.list.as_deref()
    }

    /// Names of the matched commands, outermost first.
    pub fn trail(&self) -> &[String] {
        &self.trail
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}
