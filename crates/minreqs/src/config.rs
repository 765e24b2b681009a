use minreqs_pypi::{DEFAULT_INDEX_URL, ResolveOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use toml_edit::TableLike;

pub const ENV_OFFLINE: &str = "MIN_REQS_OFFLINE";
pub const ENV_TRY_PIP: &str = "MIN_REQS_TRY_PIP";
pub const ENV_PIN_UNCONSTRAINED: &str = "MIN_REQS_PIN_UNCONSTRAINED";
pub const ENV_GROUP: &str = "MIN_REQS_GROUP";
pub const ENV_INDEX_URL: &str = "MIN_REQS_INDEX_URL";

/// Name of the optional-dependencies group written when none is configured.
pub const DEFAULT_GROUP: &str = "min-reqs";

/// One layer of user configuration.
///
/// Every field is optional so that layers (explicit options, the project's
/// stored hook table, the environment) can be stacked with
/// [`Settings::resolve`]. Field names match the keys accepted in
/// `[tool.hatch.metadata.hooks.min_requirements]`.
///
/// # Examples
///
/// ```
/// use minreqs::config::MinReqsOptions;
///
/// let json = r#"{ "offline": true, "no_pip": true, "pin_unconstrained": false }"#;
/// let options: MinReqsOptions = serde_json::from_str(json).unwrap();
///
/// assert_eq!(options.offline, Some(true));
/// assert_eq!(options.try_pip_setting(), Some(false));
/// assert_eq!(options.group, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinReqsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_pip: Option<bool>,
    /// Inverse spelling of `try_pip`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_pip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_unconstrained: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,
}

impl MinReqsOptions {
    /// Reads the `MIN_REQS_*` variables from `env`.
    ///
    /// Unrecognized boolean values are ignored with a warning and empty string
    /// values for `group`/`index_url` count as unset.
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let flag = |key: &str| env.var(key).and_then(|value| parse_bool(key, &value));
        let text = |key: &str| env.var(key).filter(|value| !value.trim().is_empty());

        Self {
            offline: flag(ENV_OFFLINE),
            try_pip: flag(ENV_TRY_PIP),
            no_pip: None,
            pin_unconstrained: flag(ENV_PIN_UNCONSTRAINED),
            group: text(ENV_GROUP),
            index_url: text(ENV_INDEX_URL),
        }
    }

    /// Reads a stored hook table, skipping values of the wrong type.
    pub fn from_table(table: &dyn TableLike) -> Self {
        let flag = |key: &str| table.get(key).and_then(|item| item.as_bool());
        let text = |key: &str| {
            table
                .get(key)
                .and_then(|item| item.as_str())
                .map(str::to_string)
        };

        for (key, _) in table.iter() {
            if !KNOWN_KEYS.contains(&key) {
                tracing::warn!("ignoring unknown min_requirements option '{}'", key);
            }
        }

        Self {
            offline: flag("offline"),
            try_pip: flag("try_pip"),
            no_pip: flag("no_pip"),
            pin_unconstrained: flag("pin_unconstrained"),
            group: text("group"),
            index_url: text("index_url"),
        }
    }

    /// Effective pip preference of this layer; `try_pip` wins over `no_pip`.
    pub fn try_pip_setting(&self) -> Option<bool> {
        self.try_pip.or(self.no_pip.map(|no_pip| !no_pip))
    }
}

const KNOWN_KEYS: &[&str] = &[
    "offline",
    "try_pip",
    "no_pip",
    "pin_unconstrained",
    "group",
    "index_url",
];

/// Concrete settings after layering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub offline: bool,
    pub try_pip: bool,
    pub pin_unconstrained: bool,
    pub group: String,
    pub index_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            offline: false,
            try_pip: true,
            pin_unconstrained: true,
            group: DEFAULT_GROUP.to_string(),
            index_url: DEFAULT_INDEX_URL.to_string(),
        }
    }
}

impl Settings {
    /// Resolves each setting from the first layer that sets it:
    /// `explicit`, then `stored`, then the environment, then the default.
    ///
    /// # Examples
    ///
    /// ```
    /// use minreqs::config::{MinReqsOptions, Settings, ENV_OFFLINE, ENV_PIN_UNCONSTRAINED};
    /// use std::collections::HashMap;
    ///
    /// let env = HashMap::from([
    ///     (ENV_OFFLINE.to_string(), "0".to_string()),
    ///     (ENV_PIN_UNCONSTRAINED.to_string(), "0".to_string()),
    /// ]);
    /// let explicit = MinReqsOptions { offline: Some(true), ..Default::default() };
    ///
    /// let settings = Settings::resolve(&explicit, &MinReqsOptions::default(), &env);
    /// assert!(settings.offline);
    /// assert!(!settings.pin_unconstrained);
    /// assert_eq!(settings.group, "min-reqs");
    /// ```
    pub fn resolve(
        explicit: &MinReqsOptions,
        stored: &MinReqsOptions,
        env: &dyn EnvSource,
    ) -> Self {
        let env = MinReqsOptions::from_env(env);
        let layers = [explicit, stored, &env];
        let defaults = Self::default();

        let flag = |pick: fn(&MinReqsOptions) -> Option<bool>, default: bool| {
            layers.iter().find_map(|layer| pick(layer)).unwrap_or(default)
        };
        let text = |pick: fn(&MinReqsOptions) -> Option<&String>, default: String| {
            layers
                .iter()
                .find_map(|layer| pick(layer).cloned())
                .unwrap_or(default)
        };

        Self {
            offline: flag(|o| o.offline, defaults.offline),
            try_pip: flag(MinReqsOptions::try_pip_setting, defaults.try_pip),
            pin_unconstrained: flag(|o| o.pin_unconstrained, defaults.pin_unconstrained),
            group: text(|o| o.group.as_ref(), defaults.group),
            index_url: text(|o| o.index_url.as_ref(), defaults.index_url),
        }
    }

    /// Flags handed to the rewriter.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            offline: self.offline,
            pin_unconstrained: self.pin_unconstrained,
        }
    }
}

/// Read access to environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

fn parse_bool(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => {
            tracing::warn!("ignoring {}={:?}: expected a boolean", key, value);
            None
        }
    }
}
