use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CrossPostError, Result};
use crate::publishers::mastodon::load_token_from_secrets;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    pub mastodon: MastodonConfig,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourceConfig {
    pub api_base_url: String,    // where profile/content lookups go
    pub public_base_url: String, // used for canonical content URLs
    pub session_dir: PathBuf,
    pub window: usize,
    pub app_id: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.instagram.com".to_string(),
            public_base_url: "https://www.instagram.com".to_string(),
            session_dir: PathBuf::from("."),
            window: 10,
            app_id: "936619743392459".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResolverConfig {
    pub url: String,
    pub api_key_env: Option<String>,
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub max_chars: usize,
    pub summarize_prompt: Option<String>, // Tera template, `text` and `limit` in context
    pub mentions_prompt: Option<String>,  // Tera template, `text` in context
    pub log_preview_chars: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            max_chars: 500,
            summarize_prompt: None,
            mentions_prompt: None,
            log_preview_chars: None,
        }
    }
}

impl LlmConfig {
    /// API key from the environment; `None` disables text generation.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MastodonConfig {
    #[serde(default = "default_max_media")]
    pub max_media_per_post: usize,
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,
}

fn default_max_media() -> usize {
    4
}

fn default_description_max_chars() -> usize {
    1500
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub instance: String,       // https://neubau.social
    pub token_env: String,      // env var holding the bearer token
    pub token_file: Option<PathBuf>, // mastodon-async credentials yaml, used when env is empty
}

/// A destination account with its secret resolved.
#[derive(Debug, Clone)]
pub struct ResolvedAccount {
    pub name: String,
    pub instance: String,
    pub access_token: String,
}

impl AppConfig {
    /// Resolves a named destination account and its token.
    ///
    /// Fails with a configuration error when the account is unknown or no token
    /// is available from either the environment or the credentials file.
    pub fn account(&self, name: &str) -> Result<ResolvedAccount> {
        let account = self.mastodon.accounts.get(name).ok_or_else(|| {
            let available: Vec<&str> = self.mastodon.accounts.keys().map(String::as_str).collect();
            CrossPostError::Configuration(format!(
                "account '{}' not found. Available accounts: [{}]",
                name,
                available.join(", ")
            ))
        })?;

        let from_env = std::env::var(&account.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        let token = match from_env {
            Some(t) => Some(t),
            None => match account.token_file.as_deref() {
                Some(path) => load_token_from_secrets(path).map_err(|e| {
                    CrossPostError::Configuration(format!(
                        "failed to read token file {}: {}",
                        path.display(),
                        e
                    ))
                })?,
                None => None,
            },
        };
        let access_token = token.ok_or_else(|| {
            CrossPostError::Configuration(format!(
                "no access token configured for account '{}' (set {})",
                name, account.token_env
            ))
        })?;

        Ok(ResolvedAccount {
            name: name.to_string(),
            instance: account.instance.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn resolver_api_key(&self) -> Option<String> {
        self.resolver
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        CrossPostError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    serde_yaml::from_str(content)
        .map_err(|e| CrossPostError::Configuration(format!("invalid config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const MINIMAL: &str = r#"
resolver:
  url: https://cobalt.example/
mastodon:
  accounts:
    kultur@neubau.social:
      instance: https://neubau.social/
      token_env: INSTADON_TEST_TOKEN_A
"#;

    #[test]
    fn defaults_are_applied() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.source.window, 10);
        assert_eq!(cfg.source.public_base_url, "https://www.instagram.com");
        assert_eq!(cfg.llm.max_chars, 500);
        assert!(cfg.llm.enabled);
        assert_eq!(cfg.mastodon.max_media_per_post, 4);
        assert_eq!(cfg.mastodon.description_max_chars, 1500);
        assert!(cfg.request_timeout_secs.is_none());
    }

    #[test]
    fn unknown_account_lists_available() {
        let cfg = parse_config(MINIMAL).unwrap();
        let err = cfg.account("nobody").unwrap_err();
        assert!(matches!(err, CrossPostError::Configuration(_)));
        assert!(err.to_string().contains("kultur@neubau.social"));
    }

    #[test]
    #[serial]
    fn missing_token_is_configuration_error() {
        unsafe { std::env::remove_var("INSTADON_TEST_TOKEN_A") };
        let cfg = parse_config(MINIMAL).unwrap();
        let err = cfg.account("kultur@neubau.social").unwrap_err();
        assert!(matches!(err, CrossPostError::Configuration(_)));
    }

    #[test]
    #[serial]
    fn token_from_env_and_instance_normalized() {
        unsafe { std::env::set_var("INSTADON_TEST_TOKEN_A", "secret") };
        let cfg = parse_config(MINIMAL).unwrap();
        let acc = cfg.account("kultur@neubau.social").unwrap();
        assert_eq!(acc.access_token, "secret");
        assert_eq!(acc.instance, "https://neubau.social");
        unsafe { std::env::remove_var("INSTADON_TEST_TOKEN_A") };
    }

    #[test]
    fn missing_resolver_is_rejected() {
        let err = parse_config("mastodon:\n  accounts: {}\n").unwrap_err();
        assert!(matches!(err, CrossPostError::Configuration(_)));
    }
}
