//! Relay configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DISCORD_BOT_TOKEN` - Bot token used for message listing and member lookups
//! - `DISCORD_PUBLIC_KEY` - Application public key (hex) for interaction signatures
//! - `DISCORD_CHANNEL_ID` - Channel polled for task messages
//! - `DISCORD_GUILD_ID` - Guild used for nickname lookups
//! - `GAS_WEBHOOK_URL` - Spreadsheet automation webhook receiving tasks
//!
//! ## Optional
//! - `RELAY_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `DISCORD_API_BASE` - Discord REST base URL (default: <https://discord.com/api/v10>)
//! - `RELAY_HTTP_TIMEOUT_SECS` - Timeout for every outbound call (default: 10)
//! - `RELAY_FILLER_PHRASES` - Comma-separated phrases stripped from task text, in order
//! - `RELAY_COMPLETION_REACTIONS` - Comma-separated emoji marking a message done
//! - `RELAY_PAYLOAD_FORMAT` - `partitioned` (default) or `flat`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use task_relay_core::{ChannelId, GuildId};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Phrases stripped from task text when `RELAY_FILLER_PHRASES` is unset.
///
/// Longer phrases come first so "よろしくお願いします" is removed whole rather
/// than leaving "よろしく" behind.
pub const DEFAULT_FILLER_PHRASES: &[&str] = &[
    "よろしくお願いします",
    "お願いします",
    "おねがいします",
    "お願い",
];

/// Reactions that mark a message as done when `RELAY_COMPLETION_REACTIONS` is unset.
pub const DEFAULT_COMPLETION_REACTIONS: &[&str] = &["👍", "✅"];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Shape of the body posted to the automation endpoint after a poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadFormat {
    /// `{"newTasks": [...], "updatedTasks": [...]}`
    #[default]
    Partitioned,
    /// A single array of tasks, new first.
    Flat,
}

impl FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partitioned" => Ok(Self::Partitioned),
            "flat" => Ok(Self::Flat),
            other => Err(format!("expected 'partitioned' or 'flat', got '{other}'")),
        }
    }
}

/// Relay application configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Discord API configuration
    pub discord: DiscordConfig,
    /// Automation webhook configuration
    pub automation: AutomationConfig,
    /// Task extraction settings
    pub extraction: ExtractionConfig,
    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Discord configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct DiscordConfig {
    /// REST API base URL, without a trailing slash.
    pub api_base: String,
    /// Bot token sent as `Authorization: Bot <token>`.
    pub bot_token: SecretString,
    /// Ed25519 public key for interaction signatures.
    pub public_key: [u8; 32],
    /// Channel polled for task messages.
    pub channel_id: ChannelId,
    /// Guild used to resolve member nicknames.
    pub guild_id: GuildId,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &"[REDACTED]")
            .field("public_key", &hex::encode(self.public_key))
            .field("channel_id", &self.channel_id)
            .field("guild_id", &self.guild_id)
            .finish()
    }
}

/// Automation webhook configuration.
///
/// The webhook URL embeds the deployment credential, so it is kept secret
/// and redacted from `Debug`.
#[derive(Clone)]
pub struct AutomationConfig {
    /// Endpoint receiving `POST` requests.
    pub webhook_url: SecretString,
    /// Body shape for poll results.
    pub payload_format: PayloadFormat,
}

impl std::fmt::Debug for AutomationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationConfig")
            .field("webhook_url", &"[REDACTED]")
            .field("payload_format", &self.payload_format)
            .finish()
    }
}

/// Task extraction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Phrases removed from task text, applied in order.
    pub filler_phrases: Vec<String>,
    /// Reaction emoji that mark a message as completed.
    pub completion_reactions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            filler_phrases: DEFAULT_FILLER_PHRASES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            completion_reactions: DEFAULT_COMPLETION_REACTIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env
            .or_default("RELAY_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let timeout_secs = env
            .or_default("RELAY_HTTP_TIMEOUT_SECS", &DEFAULT_HTTP_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("RELAY_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let discord = DiscordConfig::from_env(&env)?;
        let automation = AutomationConfig::from_env(&env)?;
        let extraction = ExtractionConfig::from_env(&env);

        Ok(Self {
            host,
            port,
            discord,
            automation,
            extraction,
            http_timeout: Duration::from_secs(timeout_secs.max(1)),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .optional("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .optional("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DiscordConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<'_, F>) -> Result<Self, ConfigError> {
        let bot_token = env.required("DISCORD_BOT_TOKEN")?;
        if let Err(e) = validate_secret_strength(&bot_token, "DISCORD_BOT_TOKEN") {
            tracing::warn!("DISCORD_BOT_TOKEN validation warning: {e}");
        }

        let public_key = parse_public_key(&env.required("DISCORD_PUBLIC_KEY")?)
            .map_err(|e| ConfigError::InvalidEnvVar("DISCORD_PUBLIC_KEY".to_string(), e))?;

        let api_base = env.or_default("DISCORD_API_BASE", DEFAULT_DISCORD_API_BASE);
        Url::parse(&api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("DISCORD_API_BASE".to_string(), e.to_string()))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: SecretString::from(bot_token),
            public_key,
            channel_id: env.required_id("DISCORD_CHANNEL_ID")?,
            guild_id: env.required_id("DISCORD_GUILD_ID")?,
        })
    }
}

impl AutomationConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<'_, F>) -> Result<Self, ConfigError> {
        let webhook_url = env.required("GAS_WEBHOOK_URL")?;
        let parsed = Url::parse(&webhook_url)
            .map_err(|e| ConfigError::InvalidEnvVar("GAS_WEBHOOK_URL".to_string(), e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "GAS_WEBHOOK_URL".to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let payload_format = env
            .optional("RELAY_PAYLOAD_FORMAT")
            .map(|raw| raw.parse::<PayloadFormat>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_PAYLOAD_FORMAT".to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            webhook_url: SecretString::from(webhook_url),
            payload_format,
        })
    }
}

impl ExtractionConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<'_, F>) -> Self {
        let defaults = Self::default();
        Self {
            filler_phrases: env
                .optional("RELAY_FILLER_PHRASES")
                .map_or(defaults.filler_phrases, |raw| parse_list(&raw)),
            completion_reactions: env
                .optional("RELAY_COMPLETION_REACTIONS")
                .map_or(defaults.completion_reactions, |raw| parse_list(&raw)),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment accessor over a lookup function.
struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get a required variable. Blank values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a required variable parsed as a snowflake ID.
    fn required_id<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.required(key)?
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Decode a hex Ed25519 public key.
fn parse_public_key(raw: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(raw.trim()).map_err(|e| format!("not valid hex: {e}"))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| format!("expected 32 bytes, got {}", bytes.len()))
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_PUBLIC_KEY: &str =
        "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DISCORD_BOT_TOKEN", "MTA4NzQ.Gx7_kP.q9Zr2vLm8TfW3yHc".to_string()),
            ("DISCORD_PUBLIC_KEY", TEST_PUBLIC_KEY.to_string()),
            ("DISCORD_CHANNEL_ID", "1100000000000000001".to_string()),
            ("DISCORD_GUILD_ID", "1200000000000000002".to_string()),
            (
                "GAS_WEBHOOK_URL",
                "https://script.google.com/macros/s/AKfy/exec".to_string(),
            ),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<RelayConfig, ConfigError> {
        RelayConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_loads_with_defaults() {
        let config = load(&base_env()).expect("config");

        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.discord.api_base, DEFAULT_DISCORD_API_BASE);
        assert_eq!(config.discord.channel_id, ChannelId::new(1_100_000_000_000_000_001));
        assert_eq!(config.discord.guild_id, GuildId::new(1_200_000_000_000_000_002));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.automation.payload_format, PayloadFormat::Partitioned);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_missing_required_variable() {
        for key in [
            "DISCORD_BOT_TOKEN",
            "DISCORD_PUBLIC_KEY",
            "DISCORD_CHANNEL_ID",
            "DISCORD_GUILD_ID",
            "GAS_WEBHOOK_URL",
        ] {
            let mut env = base_env();
            env.remove(key);
            let err = load(&env).unwrap_err();
            assert!(
                matches!(&err, ConfigError::MissingEnvVar(name) if name == key),
                "expected missing {key}, got {err}"
            );
        }
    }

    #[test]
    fn test_blank_required_variable_is_missing() {
        let mut env = base_env();
        env.insert("DISCORD_GUILD_ID", "   ".to_string());
        assert!(matches!(load(&env), Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_invalid_snowflake() {
        let mut env = base_env();
        env.insert("DISCORD_CHANNEL_ID", "general".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "DISCORD_CHANNEL_ID"
        ));
    }

    #[test]
    fn test_invalid_public_key() {
        let mut env = base_env();
        env.insert("DISCORD_PUBLIC_KEY", "abcd".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "DISCORD_PUBLIC_KEY"
        ));

        env.insert("DISCORD_PUBLIC_KEY", "zz".repeat(32));
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_webhook_url_must_be_http() {
        let mut env = base_env();
        env.insert("GAS_WEBHOOK_URL", "ftp://example.org/hook".to_string());
        assert!(load(&env).is_err());

        env.insert("GAS_WEBHOOK_URL", "not a url".to_string());
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("PORT", "8080".to_string());
        env.insert("DISCORD_API_BASE", "http://127.0.0.1:9000/api/".to_string());
        env.insert("RELAY_HTTP_TIMEOUT_SECS", "3".to_string());
        env.insert("RELAY_FILLER_PHRASES", "お願いします, please ,".to_string());
        env.insert("RELAY_COMPLETION_REACTIONS", "🎉".to_string());
        env.insert("RELAY_PAYLOAD_FORMAT", "FLAT".to_string());

        let config = load(&env).expect("config");
        assert_eq!(config.port, 8080);
        assert_eq!(config.discord.api_base, "http://127.0.0.1:9000/api");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.extraction.filler_phrases, vec!["お願いします", "please"]);
        assert_eq!(config.extraction.completion_reactions, vec!["🎉"]);
        assert_eq!(config.automation.payload_format, PayloadFormat::Flat);
    }

    #[test]
    fn test_invalid_payload_format() {
        let mut env = base_env();
        env.insert("RELAY_PAYLOAD_FORMAT", "nested".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "RELAY_PAYLOAD_FORMAT"
        ));
    }

    #[test]
    fn test_socket_addr() {
        let mut env = base_env();
        env.insert("RELAY_HOST", "127.0.0.1".to_string());
        env.insert("PORT", "3001".to_string());

        let addr = load(&env).expect("config").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&base_env()).expect("config");
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains(TEST_PUBLIC_KEY));
        assert!(!debug_output.contains("MTA4NzQ.Gx7_kP.q9Zr2vLm8TfW3yHc"));
        assert!(!debug_output.contains("AKfy"));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("your-bot-token", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }
}
