//! Deployment environment values.

use indexmap::IndexMap;

/// Prefix for process variables read by [`ProcessEnvironment`].
pub const ENV_PREFIX: &str = "STRATUM_";

/// Source of deployment-level configuration values such as the log
/// directory or the validation switch.
pub trait EnvironmentConfig {
    fn environment_value(&self, key: &str) -> Option<String>;

    /// Interpret a value as a boolean switch.
    ///
    /// Accepts `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, ignoring
    /// case. Anything else is treated as unset.
    fn flag(&self, key: &str) -> Option<bool> {
        let value = self.environment_value(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

impl<T: EnvironmentConfig + ?Sized> EnvironmentConfig for &T {
    fn environment_value(&self, key: &str) -> Option<String> {
        (**self).environment_value(key)
    }
}

/// Reads `STRATUM_<KEY>` from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl ProcessEnvironment {
    pub fn variable_name(key: &str) -> String {
        format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase())
    }
}

impl EnvironmentConfig for ProcessEnvironment {
    fn environment_value(&self, key: &str) -> Option<String> {
        std::env::var(Self::variable_name(key))
            .ok()
            .filter(|value| !value.is_empty())
    }
}

/// In-memory environment table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnvironment {
    values: IndexMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl EnvironmentConfig for MapEnvironment {
    fn environment_value(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
