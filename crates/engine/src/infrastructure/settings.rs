//! Engine configuration from the environment.
//!
//! Every knob has a default. A variable that is set but does not parse is
//! reported with a warning and the default is used instead.

use serde::{Deserialize, Serialize};

use crate::infrastructure::ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Token ceiling per UTC day across all sessions
    pub global_daily_token_limit: u64,
    /// Token ceiling per UTC day for one session
    pub session_daily_token_limit: u64,
    /// History entries kept per session (player and narrator lines both count)
    pub history_limit: usize,
    pub global_usage_ttl_days: i64,
    pub session_usage_ttl_days: i64,
    pub narrator_max_tokens: u32,
    pub narrator_temperature: f32,
    pub narrator_max_retries: u32,
    pub ollama_base_url: String,
    pub ollama_model: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_daily_token_limit: 2_000_000,
            session_daily_token_limit: 100_000,
            history_limit: 20,
            global_usage_ttl_days: 90,
            session_usage_ttl_days: 7,
            narrator_max_tokens: 800,
            narrator_temperature: 0.8,
            narrator_max_retries: 3,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            global_daily_token_limit: parse_or(
                &lookup,
                "QUESTLINE_GLOBAL_DAILY_TOKENS",
                defaults.global_daily_token_limit,
            ),
            session_daily_token_limit: parse_or(
                &lookup,
                "QUESTLINE_SESSION_DAILY_TOKENS",
                defaults.session_daily_token_limit,
            ),
            history_limit: parse_or(&lookup, "QUESTLINE_HISTORY_LIMIT", defaults.history_limit),
            global_usage_ttl_days: parse_or(
                &lookup,
                "QUESTLINE_GLOBAL_USAGE_TTL_DAYS",
                defaults.global_usage_ttl_days,
            ),
            session_usage_ttl_days: parse_or(
                &lookup,
                "QUESTLINE_SESSION_USAGE_TTL_DAYS",
                defaults.session_usage_ttl_days,
            ),
            narrator_max_tokens: parse_or(
                &lookup,
                "QUESTLINE_NARRATOR_MAX_TOKENS",
                defaults.narrator_max_tokens,
            ),
            narrator_temperature: parse_or(
                &lookup,
                "QUESTLINE_NARRATOR_TEMPERATURE",
                defaults.narrator_temperature,
            ),
            narrator_max_retries: parse_or(
                &lookup,
                "QUESTLINE_NARRATOR_MAX_RETRIES",
                defaults.narrator_max_retries,
            ),
            ollama_base_url: lookup("OLLAMA_URL")
                .or_else(|| lookup("OLLAMA_BASE_URL"))
                .unwrap_or(defaults.ollama_base_url),
            ollama_model: lookup("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "Unparseable setting, using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.global_daily_token_limit, 2_000_000);
        assert_eq!(config.session_daily_token_limit, 100_000);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.global_usage_ttl_days, 90);
        assert_eq!(config.session_usage_ttl_days, 7);
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = config_from(&[
            ("QUESTLINE_SESSION_DAILY_TOKENS", "5000"),
            ("QUESTLINE_NARRATOR_TEMPERATURE", "0.3"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "mistral"),
        ]);
        assert_eq!(config.session_daily_token_limit, 5000);
        assert!((config.narrator_temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.ollama_base_url, "http://gpu-box:11434");
        assert_eq!(config.ollama_model, "mistral");
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("QUESTLINE_HISTORY_LIMIT", "lots"),
            ("QUESTLINE_GLOBAL_DAILY_TOKENS", "-4"),
        ]);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.global_daily_token_limit, 2_000_000);
    }
}
