use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{env, fmt, fs, path::PathBuf, str::FromStr};
use thiserror::Error;
use url::Url;

/// Default REST endpoint of the ordering API.
pub const DEFAULT_BASE_URL: &str = "https://api.usderp.uz/crm/api/";

const DEFAULT_USER_AGENT: &str = "erpdesk-cli";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The YAML document did not match the configuration schema.
    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// The JSON document did not match the configuration schema.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `yaml`/`yml` nor `json`.
    #[error("Unsupported configuration format. Use 'yaml' or 'json'.")]
    UnsupportedFormat,

    /// An environment override could not be parsed.
    #[error("Invalid {name} value: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The merged configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// What the client does when a token refresh fails for good.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshFailurePolicy {
    /// Clear the stored session and notify subscribers (forced logout).
    #[default]
    Logout,
    /// Keep the stored credentials; callers still receive the refresh error.
    Retain,
}

impl RefreshFailurePolicy {
    /// Canonical configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::Retain => "retain",
        }
    }
}

impl fmt::Display for RefreshFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "logout" => Ok(Self::Logout),
            "retain" => Ok(Self::Retain),
            other => Err(format!("unknown refresh failure policy `{other}`")),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable, ANSI coloured.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// REST API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto.
    pub base_url: Url,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Optional per-request timeout enforced by the transport.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Where credentials are persisted; defaults to the user config directory.
    pub path: Option<PathBuf>,
    /// Behaviour on an irrecoverable refresh failure.
    pub on_refresh_failure: RefreshFailurePolicy,
}

impl SessionConfig {
    /// Resolve the credential file location.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_session_path)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive when `RUST_LOG` is not set.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Text,
        }
    }
}

/// The main configuration structure for erpdesk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// API connection settings.
    pub api: ApiConfig,
    /// Session persistence settings.
    pub session: SessionConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a YAML or JSON configuration file.
    /// * `base_url_override` - Optional API base URL taking precedence over everything else.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// override is malformed, or the merged configuration fails validation.
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides()?;

        if let Some(base_url) = base_url_override {
            config.api.base_url = base_url;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(serde_yml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat),
        }
    }

    /// Environment variables only fill values the file left at their defaults.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let defaults = Self::with_defaults();

        if self.api.base_url == defaults.api.base_url
            && let Ok(value) = env::var("ERPDESK_API_BASE_URL")
        {
            self.api.base_url = Url::parse(&value).map_err(|err| ConfigError::InvalidEnv {
                name: "ERPDESK_API_BASE_URL",
                reason: err.to_string(),
            })?;
        }

        if self.api.timeout_secs.is_none()
            && let Ok(value) = env::var("ERPDESK_API_TIMEOUT_SECS")
        {
            let secs = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "ERPDESK_API_TIMEOUT_SECS",
                reason: "must be a positive number of seconds".to_string(),
            })?;
            self.api.timeout_secs = Some(secs);
        }

        if self.session.path.is_none()
            && let Ok(value) = env::var("ERPDESK_SESSION_PATH")
        {
            self.session.path = Some(PathBuf::from(value));
        }

        if self.session.on_refresh_failure == defaults.session.on_refresh_failure
            && let Ok(value) = env::var("ERPDESK_ON_REFRESH_FAILURE")
        {
            self.session.on_refresh_failure =
                value.parse().map_err(|reason| ConfigError::InvalidEnv {
                    name: "ERPDESK_ON_REFRESH_FAILURE",
                    reason,
                })?;
        }

        if self.logging.level == defaults.logging.level
            && let Ok(value) = env::var("ERPDESK_LOG_LEVEL")
        {
            self.logging.level = value;
        }

        if self.logging.format == defaults.logging.format
            && let Ok(value) = env::var("ERPDESK_LOG_FORMAT")
        {
            self.logging.format = value.parse().map_err(|reason| ConfigError::InvalidEnv {
                name: "ERPDESK_LOG_FORMAT",
                reason,
            })?;
        }

        Ok(())
    }

    /// Validate the merged configuration.
    ///
    /// # Errors
    /// Returns every problem found, one message per entry.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let base = &self.api.base_url;
        if !matches!(base.scheme(), "http" | "https") {
            errors.push(format!(
                "API base URL must use http or https, got `{}`",
                base.scheme()
            ));
        }
        if base.cannot_be_a_base() {
            errors.push(format!("API base URL `{base}` cannot be used as a base"));
        }

        if self.api.timeout_secs == Some(0) {
            errors.push("API timeout must be greater than 0 seconds.".to_string());
        }

        if self.logging.level.trim().is_empty() {
            errors.push("Log level must not be empty.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn default_base_url() -> Url {
    // The constant is a well-formed absolute URL.
    Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!("default base URL is valid"))
}

/// Default credential file: `<config dir>/erpdesk/session.json`.
#[must_use]
pub fn default_session_path() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from("./session.json"),
        |dirs| dirs.config_dir().join("erpdesk").join("session.json"),
    )
}
