//! Validator configuration

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::host::HostContext;

/// Default quiet period after the last keystroke before a check fires.
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for one validated field.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use training_lib::config::ValidatorConfig;
///
/// let config = ValidatorConfig::new("/validators/check-username/")
///     .field_source("username", "id_username")
///     .with_conflict_message("This username is already taken.")
///     .with_debounce_interval(Duration::from_millis(500));
///
/// assert_eq!(config.field_sources["username"], "id_username");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Quiet period after the last input event before the check fires.
    ///
    /// Default: 1 second
    #[serde(
        rename = "debounce_interval_ms",
        with = "duration_ms",
        default = "default_debounce_interval"
    )]
    pub debounce_interval: Duration,

    /// Endpoint path (or absolute URL) of the existence check.
    pub endpoint_url: String,

    /// Request parameter name → id of the element supplying its value.
    #[serde(default)]
    pub field_sources: BTreeMap<String, String>,

    /// Text shown next to the field when the value is already in use.
    #[serde(default)]
    pub conflict_message: String,
}

fn default_debounce_interval() -> Duration {
    DEFAULT_DEBOUNCE_INTERVAL
}

impl ValidatorConfig {
    /// Creates a config for the given endpoint with default settings.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
            endpoint_url: endpoint_url.into(),
            field_sources: BTreeMap::new(),
            conflict_message: String::new(),
        }
    }

    /// Adds a request parameter read from another element at fire time.
    pub fn field_source(mut self, param: impl Into<String>, element_id: impl Into<String>) -> Self {
        self.field_sources.insert(param.into(), element_id.into());
        self
    }

    /// Sets the debounce interval.
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Sets the conflict message.
    pub fn with_conflict_message(mut self, message: impl Into<String>) -> Self {
        self.conflict_message = message.into();
        self
    }

    /// Checks that the config can drive a binding.
    pub fn validate(&self, element_id: &str) -> Result<(), ConfigError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ConfigError::invalid(element_id, "endpoint_url is empty"));
        }
        if let Some((param, _)) = self.field_sources.iter().find(|(_, id)| id.is_empty()) {
            return Err(ConfigError::invalid(
                element_id,
                format!("field source '{}' has no element id", param),
            ));
        }
        Ok(())
    }
}

/// The bindings wired on the sign-up page.
pub fn default_bindings() -> BTreeMap<String, ValidatorConfig> {
    let mut bindings = BTreeMap::new();
    bindings.insert(
        "id_username".to_string(),
        ValidatorConfig::new("/validators/check-username/")
            .field_source("username", "id_username")
            .with_conflict_message("This username is already taken."),
    );
    bindings.insert(
        "id_password1".to_string(),
        ValidatorConfig::new("/validators/check-password/")
            .field_source("password", "id_password1")
            .field_source("email", "id_email")
            .field_source("username", "id_username")
            .with_conflict_message("This password is already in use."),
    );
    bindings
}

/// Contents of a validators config file.
///
/// ```json
/// {
///   "base_url": "http://localhost:8000",
///   "host": { "is_authenticated": false, "login_url": "/accounts/login/" },
///   "bindings": {
///     "id_username": {
///       "endpoint_url": "/validators/check-username/",
///       "field_sources": { "username": "id_username" },
///       "conflict_message": "This username is already taken."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorsFile {
    /// Base URL the endpoint paths are joined onto.
    pub base_url: String,

    /// Host page state.
    #[serde(default)]
    pub host: HostContext,

    /// Element id → binding config. Defaults to [`default_bindings`].
    #[serde(default = "default_bindings")]
    pub bindings: BTreeMap<String, ValidatorConfig>,
}

impl ValidatorsFile {
    /// Creates a file config with the default bindings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            host: HostContext::default(),
            bindings: default_bindings(),
        }
    }

    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: Self = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the config as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every binding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::invalid("base_url", format!("'{}' is not a URL", self.base_url)));
        }
        for (element_id, config) in &self.bindings {
            config.validate(element_id)?;
        }
        Ok(())
    }

    /// Overrides the debounce interval of every binding.
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        for config in self.bindings.values_mut() {
            config.debounce_interval = interval;
        }
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
