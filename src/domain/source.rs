use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{HeraldError, HeraldResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    pub text: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Where an extracted image ends up in the notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePlacement {
    #[default]
    Image,
    Thumbnail,
}

/// Immutable description of one monitored source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub name: String,
    pub label: String,
    pub emoji: Option<String>,
    pub aliases: Vec<String>,
    pub url: String,
    pub interval: Duration,
    pub color: u32,
    pub thumbnail_url: Option<String>,
    /// Base for resolving relative links; the source URL is used when unset.
    pub base_url: Option<String>,
    /// Content only appears after page scripts run.
    pub render: bool,
    pub image_placement: ImagePlacement,
    pub author: Option<Author>,
    pub footer: Option<Footer>,
}

impl SourceDescriptor {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

    pub fn new(name: &str, url: &str) -> HeraldResult<Self> {
        let descriptor = Self {
            name: name.to_string(),
            label: name.to_string(),
            emoji: None,
            aliases: Vec::new(),
            url: url.trim().to_string(),
            interval: Self::DEFAULT_INTERVAL,
            color: 0,
            thumbnail_url: None,
            base_url: None,
            render: false,
            image_placement: ImagePlacement::default(),
            author: None,
            footer: None,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_footer(mut self, footer: Option<Footer>) -> Self {
        self.footer = footer;
        self
    }

    /// Check the invariants a poller relies on
    pub fn validate(&self) -> HeraldResult<()> {
        let invalid = |reason: &str| HeraldError::InvalidSource {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must be set"));
        }
        if self.url.is_empty() {
            return Err(invalid("source URL must be set"));
        }
        Url::parse(&self.url).map_err(|e| invalid(&format!("source URL is invalid: {}", e)))?;
        if let Some(base) = &self.base_url {
            Url::parse(base).map_err(|e| invalid(&format!("base URL is invalid: {}", e)))?;
        }
        if self.interval.is_zero() {
            return Err(invalid("poll interval must be positive"));
        }

        Ok(())
    }

    /// Resolve a possibly relative href against the base (or source) URL
    pub fn resolve(&self, href: &str) -> String {
        let href = href.trim();
        let base = self.base_url.as_deref().unwrap_or(&self.url);

        Url::parse(base)
            .and_then(|b| b.join(href))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }

    /// Does `name` refer to this source, by name or alias
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}
