//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.ezsolver/config.json`) and environment.
//! Environment variables take precedence over file values so deployments can keep
//! credentials out of the file entirely.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat platform (LINE Messaging API) settings.
    #[serde(default)]
    pub line: LineConfig,

    /// Computational knowledge engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Text recognition service settings.
    #[serde(default)]
    pub vision: VisionConfig,

    /// Image proxy used to build card thumbnails.
    #[serde(default)]
    pub image_proxy: ImageProxyConfig,

    /// Answer selection and trigger-word settings.
    #[serde(default)]
    pub answers: AnswersConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook HTTP server (default 7500). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the platform must reach the webhook).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    7500
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// LINE channel config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Channel access token. Overridden by LINE_TOKEN env when set.
    pub channel_token: Option<String>,
    /// Channel secret for X-Line-Signature verification. Overridden by LINE_CHANNEL_SECRET env.
    /// When unset, webhook bodies are accepted without verification.
    pub channel_secret: Option<String>,
    /// Messaging API base (reply, push).
    #[serde(default = "default_line_api_base")]
    pub api_base: String,
    /// Data API base (message content download).
    #[serde(default = "default_line_data_api_base")]
    pub data_api_base: String,
}

fn default_line_api_base() -> String {
    "https://api.line.me".to_string()
}

fn default_line_data_api_base() -> String {
    "https://api-data.line.me".to_string()
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_token: None,
            channel_secret: None,
            api_base: default_line_api_base(),
            data_api_base: default_line_data_api_base(),
        }
    }
}

/// Knowledge engine (Wolfram|Alpha v2 query API) config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Application id. Overridden by WOLFRAMALPHA_TOKEN env.
    pub app_id: Option<String>,
    #[serde(default = "default_engine_base_url")]
    pub base_url: String,
}

fn default_engine_base_url() -> String {
    "http://api.wolframalpha.com/v2/query".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            base_url: default_engine_base_url(),
        }
    }
}

/// Text recognition (Cloud Vision images:annotate) config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionConfig {
    /// API key. Overridden by VISION_KEY env.
    pub api_key: Option<String>,
    #[serde(default = "default_vision_base_url")]
    pub base_url: String,
}

fn default_vision_base_url() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_vision_base_url(),
        }
    }
}

/// Image proxy that resizes engine images into card thumbnails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProxyConfig {
    /// Base URL, e.g. "https://img-proxy.example.com". Overridden by IMAGE_PROXY_URL env.
    pub base_url: Option<String>,
}

/// Answer selection and addressing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersConfig {
    /// Max characters in a filler card's text before ".." truncation (default 60).
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Query used when a message is empty after trigger stripping (default "pi").
    #[serde(default = "default_query")]
    pub default_query: String,
    /// Short address trigger (default "ez").
    #[serde(default = "default_short_trigger")]
    pub short_trigger: String,
    /// Long address trigger (default "ezsolver").
    #[serde(default = "default_long_trigger")]
    pub long_trigger: String,
}

fn default_max_text_length() -> usize {
    60
}

fn default_query() -> String {
    "pi".to_string()
}

fn default_short_trigger() -> String {
    "ez".to_string()
}

fn default_long_trigger() -> String {
    "ezsolver".to_string()
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            max_text_length: default_max_text_length(),
            default_query: default_query(),
            short_trigger: default_short_trigger(),
            long_trigger: default_long_trigger(),
        }
    }
}

/// Non-empty trimmed env value, if set.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Env value first, then the trimmed config value; blanks count as unset.
fn resolve_secret(env_name: &str, configured: Option<&String>) -> Option<String> {
    env_value(env_name).or_else(|| {
        configured
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the LINE channel access token: env LINE_TOKEN overrides config.
pub fn resolve_line_token(config: &Config) -> Option<String> {
    resolve_secret("LINE_TOKEN", config.line.channel_token.as_ref())
}

/// Resolve the LINE channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_line_secret(config: &Config) -> Option<String> {
    resolve_secret("LINE_CHANNEL_SECRET", config.line.channel_secret.as_ref())
}

/// Resolve the engine app id: env WOLFRAMALPHA_TOKEN overrides config.
pub fn resolve_engine_app_id(config: &Config) -> Option<String> {
    resolve_secret("WOLFRAMALPHA_TOKEN", config.engine.app_id.as_ref())
}

/// Resolve the vision API key: env VISION_KEY overrides config.
pub fn resolve_vision_key(config: &Config) -> Option<String> {
    resolve_secret("VISION_KEY", config.vision.api_key.as_ref())
}

/// Resolve the image proxy base URL (without trailing slash): env IMAGE_PROXY_URL overrides config.
pub fn resolve_image_proxy_url(config: &Config) -> Option<String> {
    resolve_secret("IMAGE_PROXY_URL", config.image_proxy.base_url.as_ref())
        .map(|u| u.trim_end_matches('/').to_string())
}

/// Resolve the listen port: env PORT overrides config when it parses.
pub fn resolve_port(config: &Config) -> u16 {
    match env_value("PORT").map(|p| p.parse::<u16>()) {
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            log::warn!("ignoring unparsable PORT env value");
            config.gateway.port
        }
        None => config.gateway.port,
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("EZSOLVER_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".ezsolver").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or EZSOLVER_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 7500);
        assert_eq!(g.bind, "0.0.0.0");
    }

    #[test]
    fn default_answer_settings() {
        let a = AnswersConfig::default();
        assert_eq!(a.max_text_length, 60);
        assert_eq!(a.default_query, "pi");
        assert_eq!(a.short_trigger, "ez");
        assert_eq!(a.long_trigger, "ezsolver");
    }

    #[test]
    fn partial_file_keeps_section_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "gateway": { "port": 8080 }, "answers": { "maxTextLength": 40 } }"#,
        )
        .unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.bind, "0.0.0.0");
        assert_eq!(config.answers.max_text_length, 40);
        assert_eq!(config.answers.default_query, "pi");
        assert_eq!(config.line.api_base, "https://api.line.me");
        assert_eq!(config.engine.base_url, "http://api.wolframalpha.com/v2/query");
    }

    #[test]
    fn resolve_secret_ignores_blank_config_value() {
        assert_eq!(
            resolve_secret("EZSOLVER_TEST_UNSET_VAR", Some(&"   ".to_string())),
            None
        );
        assert_eq!(
            resolve_secret("EZSOLVER_TEST_UNSET_VAR", Some(&" abc ".to_string())),
            Some("abc".to_string())
        );
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.gateway.port, 7500);
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(br#"{ "imageProxy": { "baseUrl": "https://proxy.test/" } }"#))
            .unwrap();
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(
            config.image_proxy.base_url.as_deref(),
            Some("https://proxy.test/")
        );
    }

    #[test]
    fn load_config_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(load_config(Some(path)).is_err());
    }
}
