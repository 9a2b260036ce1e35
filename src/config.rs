//! Configuration for the support desk.
//!
//! The one fatal startup requirement is the completion-service credential;
//! everything else has a sensible default and can be overridden via the
//! builder, environment variables, or a TOML file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SupportError};

/// Environment variable holding the completion-service credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default OpenAI-compatible endpoint (Gemini's compatibility surface).
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

/// Reply surfaced when a turn cannot produce a policy-compliant answer.
pub const DEFAULT_FALLBACK_TEXT: &str =
    "Thank you for your patience. Your request has been logged and a specialist \
     will follow up with the details shortly.";

/// Desk-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Model served by the completion endpoint.
    pub model: String,

    /// Base URL of the OpenAI-compatible completion endpoint.
    pub api_base: String,

    /// Credential for the completion endpoint. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Maximum handoffs within one turn before falling back to General.
    pub max_handoffs: usize,

    /// Maximum completion/tool cycles within one turn.
    pub max_tool_cycles: usize,

    /// How many regenerations to request after a guardrail block.
    pub guardrail_retries: usize,

    /// Text substituted when no compliant reply could be produced.
    pub fallback_text: String,

    /// Deadline for a single completion call. Kept last so the TOML form
    /// serializes cleanly (it is a table, not a scalar).
    pub completion_timeout: Duration,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            completion_timeout: Duration::from_secs(30),
            max_handoffs: 5,
            max_tool_cycles: 8,
            guardrail_retries: 1,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }
}

impl DeskConfig {
    /// Load configuration from the environment.
    ///
    /// A missing credential is a fatal startup error; everything else falls
    /// back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.api_key = Some(std::env::var(API_KEY_VAR).map_err(|_| {
            SupportError::ConfigurationMissing {
                name: API_KEY_VAR.to_string(),
            }
        })?);

        if let Ok(model) = std::env::var("SUPPORT_DESK_MODEL") {
            config.model = model;
        }

        if let Ok(base) = std::env::var("SUPPORT_DESK_API_BASE") {
            config.api_base = base;
        }

        if let Ok(timeout) = std::env::var("SUPPORT_DESK_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.completion_timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }

    /// Load configuration from a TOML file. The credential still comes from
    /// the environment or the builder, never from the file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| SupportError::Other(e.to_string()))
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Fluent builder for [`DeskConfig`], mainly for tests and embedders.
pub struct ConfigBuilder {
    config: DeskConfig,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DeskConfig::default(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout = timeout;
        self
    }

    pub fn max_handoffs(mut self, max: usize) -> Self {
        self.config.max_handoffs = max;
        self
    }

    pub fn max_tool_cycles(mut self, max: usize) -> Self {
        self.config.max_tool_cycles = max;
        self
    }

    pub fn guardrail_retries(mut self, retries: usize) -> Self {
        self.config.guardrail_retries = retries;
        self
    }

    pub fn fallback_text(mut self, text: impl Into<String>) -> Self {
        self.config.fallback_text = text.into();
        self
    }

    pub fn build(self) -> DeskConfig {
        self.config
    }
}
