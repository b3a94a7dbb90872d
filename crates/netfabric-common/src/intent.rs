//! Configuration intents handed to the config-push engine.
//!
//! An intent names a configuration template and the ordered variable
//! bindings to render it with. The push engine applies a fabric's intents
//! transactionally, in the order they were emitted.

use serde::{Deserialize, Serialize};

/// Name/value tuple of a template variable.
pub type TemplateVar = (String, String);

/// Ordered template variable bindings.
pub type TemplateVars = Vec<TemplateVar>;

/// Helper trait for working with template variable collections.
pub trait TemplateVarsExt {
    /// Gets the value for a variable, if bound.
    fn get_var(&self, name: &str) -> Option<&str>;

    /// Gets the value for a variable, returning the default if not bound.
    fn get_var_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str;

    /// Checks if a variable is bound.
    fn has_var(&self, name: &str) -> bool;

    /// Binds a variable, replacing the value in place if already bound.
    fn set_var(&mut self, name: &str, value: &str);
}

impl TemplateVarsExt for TemplateVars {
    fn get_var(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn get_var_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_var(name).unwrap_or(default)
    }

    fn has_var(&self, name: &str) -> bool {
        self.iter().any(|(n, _)| n == name)
    }

    fn set_var(&mut self, name: &str, value: &str) {
        match self.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.push((name.to_string(), value.to_string())),
        }
    }
}

/// Builds a TemplateVars collection from name-value pairs.
#[macro_export]
macro_rules! template_vars {
    ($($name:expr => $value:expr),* $(,)?) => {
        vec![
            $(($name.to_string(), $value.to_string()),)*
        ]
    };
}

/// Renders a boolean the way templates expect it.
pub fn bool_var(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// A single template application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIntent {
    /// Template key, e.g. `fabric-vpc-domain-base`.
    pub template: String,
    /// Target device, when the template targets one device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub vars: TemplateVars,
}

impl ConfigIntent {
    /// Creates an intent targeting a single device.
    pub fn for_device(
        template: impl Into<String>,
        device: impl Into<String>,
        vars: TemplateVars,
    ) -> Self {
        Self {
            template: template.into(),
            device: Some(device.into()),
            vars,
        }
    }

    /// Creates an intent that is not bound to a device (e.g. pool setup).
    pub fn global(template: impl Into<String>, vars: TemplateVars) -> Self {
        Self {
            template: template.into(),
            device: None,
            vars,
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get_var(name)
    }
}

/// An allocation that was requested but not yet granted. The owning
/// switch-pair is skipped for this pass and picked up by the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAllocation {
    pub switch_pair: String,
    pub pool: String,
    pub allocation: String,
}

/// Ordered intents of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub intents: Vec<ConfigIntent>,
    #[serde(default)]
    pub pending: Vec<PendingAllocation>,
}

impl ReconciliationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: ConfigIntent) {
        self.intents.push(intent);
    }

    /// Returns true if no unit of work was suspended.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Intents rendering the given template, in emission order.
    pub fn with_template<'a>(&'a self, template: &'a str) -> impl Iterator<Item = &'a ConfigIntent> {
        self.intents.iter().filter(move |i| i.template == template)
    }

    /// Intents targeting the given device, in emission order.
    pub fn for_device<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a ConfigIntent> {
        self.intents
            .iter()
            .filter(move |i| i.device.as_deref() == Some(device))
    }
}
