use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{Author, Footer, ImagePlacement, SourceDescriptor};
use crate::errors::{HeraldError, HeraldResult};
use crate::strategies::{self, steam_feed_url, ExtractionStrategy, StrategyConfig};

const BUILTIN_SOURCES: &str = include_str!("defaults.toml");

/// The `[[source]]` table, as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceTable {
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub steam_app_id: Option<u32>,
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub render: bool,
    #[serde(default)]
    pub image_placement: ImagePlacement,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub footer: Option<Footer>,
    pub strategy: StrategyConfig,
}

/// A validated source and the strategy built for it.
#[derive(Clone)]
pub struct ConfiguredSource {
    pub descriptor: SourceDescriptor,
    pub strategy: Arc<dyn ExtractionStrategy>,
}

impl SourceEntry {
    fn url(&self) -> HeraldResult<String> {
        match (&self.url, self.steam_app_id) {
            (Some(_), Some(_)) => Err(HeraldError::InvalidSource {
                name: self.name.clone(),
                reason: "set either url or steam_app_id, not both".to_string(),
            }),
            (Some(url), None) => Ok(url.clone()),
            (None, Some(app_id)) => Ok(steam_feed_url(app_id)),
            (None, None) => Ok(String::new()),
        }
    }

    pub fn descriptor(&self) -> HeraldResult<SourceDescriptor> {
        let mut descriptor = SourceDescriptor::new(&self.name, &self.url()?)?;

        if let Some(label) = &self.label {
            descriptor.label = label.clone();
        }
        descriptor.emoji = self.emoji.clone();
        descriptor.aliases = self.aliases.clone();
        if let Some(secs) = self.interval_secs {
            descriptor.interval = Duration::from_secs(secs);
        }
        descriptor.color = self.color;
        descriptor.thumbnail_url = self.thumbnail_url.clone();
        descriptor.base_url = self.base_url.clone();
        descriptor.render = self.render;
        descriptor.image_placement = self.image_placement;
        descriptor.author = self.author.clone();
        descriptor.footer = self.footer.clone();

        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn build(&self) -> HeraldResult<ConfiguredSource> {
        let descriptor = self.descriptor()?;
        let strategy = strategies::build(&self.strategy).map_err(|e| HeraldError::InvalidSource {
            name: self.name.clone(),
            reason: format!("{} strategy: {}", self.strategy.kind(), e),
        })?;

        Ok(ConfiguredSource {
            descriptor,
            strategy,
        })
    }
}

impl SourceTable {
    pub fn parse(content: &str) -> HeraldResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn builtin() -> HeraldResult<Self> {
        Self::parse(BUILTIN_SOURCES)
    }

    /// Read the table at `path`, or the built-in one
    pub fn load(path: Option<&Path>) -> HeraldResult<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    HeraldError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::parse(&content)
            }
            None => Self::builtin(),
        }
    }

    /// Validate every entry and build its strategy, failing on the first problem
    pub fn build(&self) -> HeraldResult<Vec<ConfiguredSource>> {
        let mut seen = HashSet::new();
        let mut configured = Vec::with_capacity(self.sources.len());

        for entry in &self.sources {
            for name in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                if !seen.insert(name.trim().to_lowercase()) {
                    return Err(HeraldError::DuplicateSource(name.clone()));
                }
            }
            configured.push(entry.build()?);
        }

        Ok(configured)
    }
}
