//! Named regex fragments composed into object list selectors.
//!
//! A selector references fragments as `#name`; `##` stands for a literal `#`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::{EntityKind, ModelError};

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(#|[A-Za-z0-9_]+)").expect("capture token pattern is valid"));

#[derive(Debug, Clone, Default)]
pub struct CaptureRegistry {
    filters: BTreeMap<String, String>,
}

impl CaptureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fragment` under `name`.
    ///
    /// A fragment without an unescaped `(` is wrapped in a capturing group.
    pub fn register(&mut self, name: &str, fragment: &str) -> Result<(), ModelError> {
        if self.filters.contains_key(name) {
            return Err(ModelError::duplicate(EntityKind::Capture, name));
        }
        Regex::new(fragment).map_err(|e| ModelError::invalid_pattern(fragment, e))?;

        let capture = if fragment.replace(r"\(", "").contains('(') {
            fragment.to_string()
        } else {
            format!("({fragment})")
        };
        debug!(event = "Capture", phase = "Register", name, capture);
        self.filters.insert(name.to_string(), capture);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.filters.get(name).map(String::as_str)
    }

    /// Expand every `#name` token of `selector`.
    ///
    /// Unregistered tokens are kept as written.
    pub fn compose(&self, selector: &str) -> String {
        TOKEN
            .replace_all(selector, |caps: &Captures| {
                let token = &caps[1];
                if token == "#" {
                    return "#".to_string();
                }
                match self.filters.get(token) {
                    Some(capture) => capture.clone(),
                    None => {
                        warn!(event = "Capture", phase = "Compose", token, selector, "unknown capture left unexpanded");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }
}
