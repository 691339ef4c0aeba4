pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{HeraldError, HeraldResult};
use crate::fetch::http::DEFAULT_USER_AGENT;
use crate::fetch::FetchConfig;

pub use sources::{ConfiguredSource, SourceEntry, SourceTable};

/// Where notifications are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Webhook {
        endpoint: String,
        username: Option<String>,
        avatar_url: Option<String>,
    },
    Channel {
        url: String,
        token: String,
        channel: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` when neither a webhook nor a channel is configured.
    pub sink: Option<SinkConfig>,
    pub sources_path: Option<PathBuf>,
    pub fetch: FetchConfig,
    pub render_command: Option<String>,
    /// Extra image URL markers treated as stock logos.
    pub placeholder_markers: Vec<String>,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> HeraldResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> HeraldResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let sink = match (var("HERALD_WEBHOOK_URL"), var("HERALD_CHANNEL_URL")) {
            (Some(endpoint), _) => Some(SinkConfig::Webhook {
                endpoint,
                username: var("HERALD_WEBHOOK_USERNAME"),
                avatar_url: var("HERALD_WEBHOOK_AVATAR_URL"),
            }),
            (None, Some(url)) => Some(SinkConfig::Channel {
                url,
                token: var("HERALD_CHANNEL_TOKEN")
                    .ok_or_else(|| HeraldError::MissingEnvVar("HERALD_CHANNEL_TOKEN".to_string()))?,
                channel: var("HERALD_CHANNEL").unwrap_or_else(|| "news".to_string()),
            }),
            (None, None) => None,
        };

        let timeout = match var("HERALD_REQUEST_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs.parse().map_err(|_| {
                    HeraldError::Config(format!("HERALD_REQUEST_TIMEOUT_SECS is not a number: {}", secs))
                })?;
                if secs == 0 {
                    return Err(HeraldError::Config(
                        "HERALD_REQUEST_TIMEOUT_SECS must be positive".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => FetchConfig::default().timeout,
        };

        Ok(Self {
            sink,
            sources_path: var("HERALD_SOURCES").map(PathBuf::from),
            fetch: FetchConfig {
                user_agent: var("HERALD_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                timeout,
            },
            render_command: var("HERALD_RENDER_COMMAND"),
            placeholder_markers: var("HERALD_PLACEHOLDER_IMAGES")
                .map(|markers| {
                    markers
                        .split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// The delivery destination, required unless running dry
    pub fn require_sink(&self) -> HeraldResult<&SinkConfig> {
        self.sink
            .as_ref()
            .ok_or_else(|| HeraldError::MissingEnvVar("HERALD_WEBHOOK_URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> HeraldResult<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.sink.is_none());
        assert!(config.sources_path.is_none());
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
        assert!(config.render_command.is_none());
        assert!(config.placeholder_markers.is_empty());
        assert!(matches!(
            config.require_sink().unwrap_err(),
            HeraldError::MissingEnvVar(_)
        ));
    }

    #[test]
    fn test_webhook_wins_over_channel() {
        let config = config(&[
            ("HERALD_WEBHOOK_URL", "123/abc"),
            ("HERALD_WEBHOOK_USERNAME", "Herald"),
            ("HERALD_CHANNEL_URL", "http://localhost:8080"),
        ])
        .unwrap();

        assert_eq!(
            config.sink,
            Some(SinkConfig::Webhook {
                endpoint: "123/abc".to_string(),
                username: Some("Herald".to_string()),
                avatar_url: None,
            })
        );
    }

    #[test]
    fn test_channel_needs_token() {
        let err = config(&[("HERALD_CHANNEL_URL", "http://localhost:8080")]).unwrap_err();
        assert!(matches!(err, HeraldError::MissingEnvVar(name) if name == "HERALD_CHANNEL_TOKEN"));

        let config = config(&[
            ("HERALD_CHANNEL_URL", "http://localhost:8080"),
            ("HERALD_CHANNEL_TOKEN", "secret"),
        ])
        .unwrap();
        assert_eq!(
            config.sink,
            Some(SinkConfig::Channel {
                url: "http://localhost:8080".to_string(),
                token: "secret".to_string(),
                channel: "news".to_string(),
            })
        );
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config(&[("HERALD_WEBHOOK_URL", "  "), ("HERALD_SOURCES", "")]).unwrap();
        assert!(config.sink.is_none());
        assert!(config.sources_path.is_none());
    }

    #[test]
    fn test_timeout_parsing() {
        let config = config(&[("HERALD_REQUEST_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));

        assert!(config_err("abc"));
        assert!(config_err("0"));
    }

    #[test]
    fn test_placeholder_markers_are_comma_separated() {
        let config = config(&[("HERALD_PLACEHOLDER_IMAGES", "default_share.png, ,blank-logo ")]).unwrap();
        assert_eq!(config.placeholder_markers, vec!["default_share.png", "blank-logo"]);
    }

    fn config_err(timeout: &str) -> bool {
        matches!(
            config(&[("HERALD_REQUEST_TIMEOUT_SECS", timeout)]),
            Err(HeraldError::Config(_))
        )
    }
}
