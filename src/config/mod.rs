//! Configuration management
//!
//! This module handles loading and parsing configuration for pytestgen.
//! Configuration can be loaded from:
//! - pytestgen.yml file
//! - Environment variables (override file settings, `.env` included)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat model connection
    #[serde(default)]
    pub llm: LlmConfig,
    /// Prompt construction
    #[serde(default)]
    pub prompt: PromptConfig,
    /// pytest invocation
    #[serde(default)]
    pub pytest: PytestConfig,
}

/// Azure OpenAI chat deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default)]
    pub endpoint: Option<String>,
    /// API key sent in the `api-key` header
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Deployment name
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub temperature: f32,
    /// Completion token limit (unset leaves it to the service)
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Extra attempts after a retryable failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            deployment: None,
            api_version: default_api_version(),
            temperature: 0.0,
            max_tokens: None,
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01-preview".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    60
}

/// Prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Send the module source along with the function listing
    #[serde(default = "default_include_source")]
    pub include_source: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_source: default_include_source(),
        }
    }
}

fn default_include_source() -> bool {
    true
}

/// pytest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PytestConfig {
    /// Executable to run
    #[serde(default = "default_pytest_command")]
    pub command: String,
    /// Arguments placed before the test file path
    #[serde(default = "default_pytest_args")]
    pub args: Vec<String>,
}

impl Default for PytestConfig {
    fn default() -> Self {
        Self {
            command: default_pytest_command(),
            args: default_pytest_args(),
        }
    }
}

fn default_pytest_command() -> String {
    "pytest".to_string()
}

fn default_pytest_args() -> Vec<String> {
    vec!["-q".to_string()]
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables:
    /// - AZURE_OPENAI_ENDPOINT
    /// - AZURE_OPENAI_API_KEY
    /// - AZURE_OPENAI_DEPLOYMENT
    /// - AZURE_OPENAI_API_VERSION (falls back to OPENAI_API_VERSION)
    /// - PYTESTGEN_TEMPERATURE
    /// - PYTESTGEN_MAX_RETRIES
    /// - PYTESTGEN_TIMEOUT_SECS
    /// - PYTESTGEN_PYTEST_COMMAND
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Some(endpoint) = non_empty_env("AZURE_OPENAI_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Some(api_key) = non_empty_env("AZURE_OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Some(deployment) = non_empty_env("AZURE_OPENAI_DEPLOYMENT") {
            self.llm.deployment = Some(deployment);
        }
        if let Some(version) = non_empty_env("AZURE_OPENAI_API_VERSION")
            .or_else(|| non_empty_env("OPENAI_API_VERSION"))
        {
            self.llm.api_version = version;
        }

        if let Some(temperature) = non_empty_env("PYTESTGEN_TEMPERATURE") {
            if let Ok(temperature) = temperature.parse::<f32>() {
                self.llm.temperature = temperature;
            }
        }
        if let Some(retries) = non_empty_env("PYTESTGEN_MAX_RETRIES") {
            if let Ok(retries) = retries.parse::<u32>() {
                self.llm.max_retries = retries;
            }
        }
        if let Some(timeout) = non_empty_env("PYTESTGEN_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.llm.timeout_secs = timeout;
            }
        }

        if let Some(command) = non_empty_env("PYTESTGEN_PYTEST_COMMAND") {
            self.pytest.command = command;
        }
    }
}

impl LlmConfig {
    /// Check that everything needed to reach the deployment is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_blank(&self.deployment) {
            return Err(ConfigError::ValidationError(
                "set AZURE_OPENAI_DEPLOYMENT (the deployment name) in the environment or .env"
                    .to_string(),
            ));
        }
        if is_blank(&self.endpoint) {
            return Err(ConfigError::ValidationError(
                "set AZURE_OPENAI_ENDPOINT in the environment or .env".to_string(),
            ));
        }
        if is_blank(&self.api_key) {
            return Err(ConfigError::ValidationError(
                "set AZURE_OPENAI_API_KEY in the environment or .env".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_DEPLOYMENT",
    "AZURE_OPENAI_API_VERSION",
    "OPENAI_API_VERSION",
    "PYTESTGEN_TEMPERATURE",
    "PYTESTGEN_MAX_RETRIES",
    "PYTESTGEN_TIMEOUT_SECS",
    "PYTESTGEN_PYTEST_COMMAND",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
