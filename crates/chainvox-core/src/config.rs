//! ============================================================================
//! Configuration - Injected at Startup, Never Compiled In
//! ============================================================================
//! Resolved from environment variables (a `.env` file is loaded by the
//! binary via dotenvy before this runs). Credentials stay out of Debug output.
//! ============================================================================

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Default chat-completions endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4.1";

/// Pause after our own speech before listening again
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 700;

/// Number of mints summarized per recent-mints query
pub const DEFAULT_MINT_LIMIT: u32 = 7;

/// Supported Base networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainNetwork {
    BaseMainnet,
    BaseSepolia,
}

impl ChainNetwork {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "base-mainnet" | "mainnet" | "base" => Ok(ChainNetwork::BaseMainnet),
            "base-sepolia" | "sepolia" => Ok(ChainNetwork::BaseSepolia),
            other => Err(anyhow!(
                "Unknown network '{}'. Valid values: base-mainnet, base-sepolia",
                other
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainNetwork::BaseMainnet => "base-mainnet",
            ChainNetwork::BaseSepolia => "base-sepolia",
        }
    }

    /// Alchemy JSON-RPC endpoint for this network
    pub fn rpc_url(&self, api_key: &str) -> String {
        format!("https://{}.g.alchemy.com/v2/{}", self.as_str(), api_key)
    }
}

/// Chain data provider settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub network: ChainNetwork,
    pub api_key: Option<String>,
    /// Full endpoint override (takes precedence over network + key)
    pub rpc_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl ChainConfig {
    /// Endpoint to call, if one can be derived
    pub fn endpoint(&self) -> Option<String> {
        if let Some(url) = self.rpc_url.as_ref().filter(|u| !u.is_empty()) {
            return Some(url.clone());
        }
        self.api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|key| self.network.rpc_url(key))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfig")
            .field("network", &self.network)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("rpc_url", &self.rpc_url.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Chat-completion service settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl ModelConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// How the controller re-arms after speaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListeningMode {
    /// Wait for the wake phrase before every utterance
    WakeWord,
    /// Listen again directly after each reply
    Continuous,
}

impl ListeningMode {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "wake_word" | "wake-word" | "wakeword" => Ok(ListeningMode::WakeWord),
            "continuous" => Ok(ListeningMode::Continuous),
            other => Err(anyhow!(
                "Unknown voice mode '{}'. Valid values: wake_word, continuous",
                other
            )),
        }
    }
}

/// Voice session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub enabled: bool,
    pub mode: ListeningMode,
    pub wake_word_model_paths: Vec<PathBuf>,
    pub wake_word_label: String,
    pub settle_delay_ms: u64,
    pub tts_lang: String,
    /// Upper bound on a single dispatch before an apology is produced
    pub dispatch_timeout_secs: u64,
}

impl VoiceConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: ListeningMode::WakeWord,
            wake_word_model_paths: Vec::new(),
            wake_word_label: "hey_chainvox".to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            tts_lang: "en-US".to_string(),
            dispatch_timeout_secs: 60,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub model: ModelConfig,
    pub voice: VoiceConfig,
    pub retry: RetryConfig,
    pub mint_limit: u32,
}

impl AppConfig {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from any key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let timeout = parse_or(get("REQUEST_TIMEOUT_SECS"), 20u64, "REQUEST_TIMEOUT_SECS")?;

        let network = match get("CHAIN_NETWORK") {
            Some(value) => ChainNetwork::parse(&value)?,
            None => ChainNetwork::BaseMainnet,
        };

        let chain = ChainConfig {
            network,
            api_key: get("ALCHEMY_API_KEY"),
            rpc_url: get("CHAIN_RPC_URL"),
            request_timeout_secs: timeout,
        };

        let model = ModelConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            temperature: parse_or(get("LLM_TEMPERATURE"), 0.7f32, "LLM_TEMPERATURE")?,
            max_tokens: parse_or(get("LLM_MAX_TOKENS"), 1000u32, "LLM_MAX_TOKENS")?,
            request_timeout_secs: timeout,
        };

        let defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            enabled: parse_bool(get("VOICE_ENABLED"), defaults.enabled, "VOICE_ENABLED")?,
            mode: match get("VOICE_MODE") {
                Some(value) => ListeningMode::parse(&value)?,
                None => defaults.mode,
            },
            wake_word_model_paths: get("WAKE_WORD_MODEL_PATHS")
                .map(|paths| {
                    paths
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default(),
            wake_word_label: get("WAKE_WORD_LABEL").unwrap_or(defaults.wake_word_label),
            settle_delay_ms: parse_or(get("VOICE_SETTLE_MS"), defaults.settle_delay_ms, "VOICE_SETTLE_MS")?,
            tts_lang: get("TTS_LANG").unwrap_or(defaults.tts_lang),
            dispatch_timeout_secs: parse_or(
                get("DISPATCH_TIMEOUT_SECS"),
                defaults.dispatch_timeout_secs,
                "DISPATCH_TIMEOUT_SECS",
            )?,
        };

        let retry_defaults = RetryConfig::default();
        let retry = RetryConfig {
            max_attempts: parse_or(get("RETRY_MAX_ATTEMPTS"), retry_defaults.max_attempts, "RETRY_MAX_ATTEMPTS")?,
            base_delay_ms: parse_or(get("RETRY_BASE_DELAY_MS"), retry_defaults.base_delay_ms, "RETRY_BASE_DELAY_MS")?,
            max_delay_ms: parse_or(get("RETRY_MAX_DELAY_MS"), retry_defaults.max_delay_ms, "RETRY_MAX_DELAY_MS")?,
            jitter: retry_defaults.jitter,
        };

        Ok(Self {
            chain,
            model,
            voice,
            retry,
            mint_limit: DEFAULT_MINT_LIMIT,
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T, key: &str) -> Result<T> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool, key: &str) -> Result<bool> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(anyhow!("Invalid value for {}: '{}'", key, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.chain.network, ChainNetwork::BaseMainnet);
        assert!(config.chain.endpoint().is_none());
        assert_eq!(config.model.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(config.voice.settle_delay_ms, 700);
        assert_eq!(config.voice.mode, ListeningMode::WakeWord);
        assert!(!config.voice.enabled);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.mint_limit, 7);
    }

    #[test]
    fn test_endpoint_derivation() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ALCHEMY_API_KEY", "abc"),
            ("CHAIN_NETWORK", "base-sepolia"),
        ]))
        .unwrap();
        assert_eq!(
            config.chain.endpoint().as_deref(),
            Some("https://base-sepolia.g.alchemy.com/v2/abc")
        );

        let config = AppConfig::from_lookup(lookup(&[
            ("ALCHEMY_API_KEY", "abc"),
            ("CHAIN_RPC_URL", "http://localhost:8545"),
        ]))
        .unwrap();
        assert_eq!(config.chain.endpoint().as_deref(), Some("http://localhost:8545"));
    }

    #[test]
    fn test_voice_settings_from_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("VOICE_ENABLED", "true"),
            ("VOICE_MODE", "continuous"),
            ("WAKE_WORD_MODEL_PATHS", "a.ppn, b.pv"),
            ("VOICE_SETTLE_MS", "250"),
        ]))
        .unwrap();
        assert!(config.voice.enabled);
        assert_eq!(config.voice.mode, ListeningMode::Continuous);
        assert_eq!(
            config.voice.wake_word_model_paths,
            vec![PathBuf::from("a.ppn"), PathBuf::from("b.pv")]
        );
        assert_eq!(config.voice.settle_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("CHAIN_NETWORK", "solana")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("VOICE_ENABLED", "maybe")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("LLM_MAX_TOKENS", "lots")])).is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ALCHEMY_API_KEY", "secret-chain-key"),
            ("OPENAI_API_KEY", "secret-model-key"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-chain-key"));
        assert!(!rendered.contains("secret-model-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
