//! Static configuration, loaded once at startup.

use std::error::Error;
use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

use chatline_core::ChatBehavior;
use chatline_gateway::SamplingParams;
use serde::Deserialize;

/// The error produced while loading or validating the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid TOML.
    Parse(toml::de::Error),
    /// A value is outside its documented range.
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read config: {err}"),
            ConfigError::Parse(err) => write!(f, "cannot parse config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Application configuration.
///
/// Every field has a default, so an empty file (or an absent section)
/// yields a working configuration; only the API key, which never lives
/// in the file, is truly required.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Completion endpoint and sampling configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Conversation behavior configuration.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// The `[gateway]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature, in `[0, 1]`.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound for the generated token count.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Nucleus sampling mass, in `[0, 1]`.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Frequency penalty, in `[-2, 2]`.
    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f32,
    /// Presence penalty, in `[-2, 2]`.
    #[serde(default)]
    pub presence_penalty: f32,
    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            frequency_penalty: default_frequency_penalty(),
            presence_penalty: 0.0,
            base_url: None,
        }
    }
}

/// The `[chat]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Per-conversation message bound.
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,
    /// System instruction seeded into new conversations.
    #[serde(default)]
    pub system_instruction: String,
    /// Reply sent when the completion gateway fails.
    #[serde(default)]
    pub fallback_reply: Option<String>,
    /// Inbound texts answered with `greeting_reply` directly.
    #[serde(default)]
    pub greeting_words: Option<Vec<String>>,
    /// The canned reply for greetings.
    #[serde(default)]
    pub greeting_reply: Option<String>,
    /// Reply sent when rejecting an incoming voice call.
    #[serde(default)]
    pub call_reject_reply: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_limit: default_message_limit(),
            system_instruction: String::new(),
            fallback_reply: None,
            greeting_words: None,
            greeting_reply: None,
            call_reject_reply: None,
        }
    }
}

impl ChatConfig {
    /// Converts into the router behavior, falling back to the stock
    /// replies for anything not configured.
    pub fn to_behavior(&self) -> ChatBehavior {
        let stock = ChatBehavior::default();
        ChatBehavior {
            system_instruction: self.system_instruction.clone(),
            fallback_reply: self
                .fallback_reply
                .clone()
                .unwrap_or(stock.fallback_reply),
            greeting_words: self
                .greeting_words
                .clone()
                .unwrap_or(stock.greeting_words),
            greeting_reply: self
                .greeting_reply
                .clone()
                .unwrap_or(stock.greeting_reply),
            call_reject_reply: self
                .call_reject_reply
                .clone()
                .unwrap_or(stock.call_reject_reply),
        }
    }
}

impl AppConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::parse(&raw)
    }

    /// Parses and validates configuration text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the sampling parameters for completion requests.
    pub fn sampling(&self) -> SamplingParams {
        let gateway = &self.gateway;
        SamplingParams {
            model: gateway.model.clone(),
            temperature: gateway.temperature,
            max_tokens: gateway.max_tokens,
            top_p: gateway.top_p,
            frequency_penalty: gateway.frequency_penalty,
            presence_penalty: gateway.presence_penalty,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let gateway = &self.gateway;
        if !(0.0..=1.0).contains(&gateway.temperature) {
            return Err(ConfigError::Invalid(
                "temperature must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&gateway.top_p) {
            return Err(ConfigError::Invalid("top_p must be within [0, 1]"));
        }
        if !(-2.0..=2.0).contains(&gateway.frequency_penalty) {
            return Err(ConfigError::Invalid(
                "frequency_penalty must be within [-2, 2]",
            ));
        }
        if !(-2.0..=2.0).contains(&gateway.presence_penalty) {
            return Err(ConfigError::Invalid(
                "presence_penalty must be within [-2, 2]",
            ));
        }
        if self.chat.message_limit == 0 {
            return Err(ConfigError::Invalid(
                "message_limit must be positive",
            ));
        }
        Ok(())
    }
}

fn default_model() -> String {
    "gpt-4.1-nano".to_owned()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_top_p() -> f32 {
    1.0
}

fn default_frequency_penalty() -> f32 {
    1.0
}

fn default_message_limit() -> usize {
    10
}
