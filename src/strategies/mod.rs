//! Extraction strategies and the configuration they are built from.

pub mod traits;
pub mod open_graph;
pub mod rss;
pub mod dom;

use std::sync::Arc;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::errors::{HeraldError, HeraldResult};

pub use dom::{DomStrategy, FieldRule, Read};
pub use open_graph::OpenGraphStrategy;
pub use rss::{steam_feed_url, RssItemStrategy};
pub use traits::{DetailSource, ExtractionStrategy};

/// Strategy selection for one source, as written in the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Follow the first `latest` link and read Open Graph tags from its page.
    OpenGraph {
        latest: String,
        #[serde(default = "default_link_attr")]
        attr: String,
    },
    Rss,
    Dom(DomConfig),
}

impl StrategyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::OpenGraph { .. } => "open_graph",
            StrategyConfig::Rss => "rss",
            StrategyConfig::Dom(_) => "dom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomConfig {
    pub item: String,
    #[serde(default)]
    pub link: FieldSpec,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub title: Option<FieldSpec>,
    #[serde(default)]
    pub body: Option<FieldSpec>,
    #[serde(default)]
    pub image: Option<FieldSpec>,
}

/// One field lookup: an optional selector and what to read from the match.
///
/// With neither `attr` nor `style_url` the element's text is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub style_url: bool,
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn selector(css: &str) -> HeraldResult<Selector> {
    Selector::parse(css)
        .map_err(|e| HeraldError::Config(format!("invalid selector '{}': {:?}", css, e)))
}

impl FieldSpec {
    fn to_rule(&self, default_read: Read) -> HeraldResult<FieldRule> {
        let sel = self.selector.as_deref().map(selector).transpose()?;
        let read = match (&self.attr, self.style_url) {
            (Some(_), true) => {
                return Err(HeraldError::Config(
                    "field cannot set both attr and style_url".to_string(),
                ))
            }
            (Some(attr), false) => Read::Attr(attr.clone()),
            (None, true) => Read::StyleUrl,
            (None, false) => default_read,
        };
        Ok(FieldRule::new(sel, read))
    }
}

/// Build the strategy a source table entry asks for
pub fn build(config: &StrategyConfig) -> HeraldResult<Arc<dyn ExtractionStrategy>> {
    let strategy: Arc<dyn ExtractionStrategy> = match config {
        StrategyConfig::OpenGraph { latest, attr } => {
            Arc::new(OpenGraphStrategy::new(selector(latest)?, attr))
        }
        StrategyConfig::Rss => Arc::new(RssItemStrategy::new()),
        StrategyConfig::Dom(dom) => Arc::new(DomStrategy {
            item: selector(&dom.item)?,
            link: dom.link.to_rule(Read::Attr(default_link_attr()))?,
            detail: dom.detail.as_deref().map(selector).transpose()?,
            title: dom.title.as_ref().map(|f| f.to_rule(Read::Text)).transpose()?,
            body: dom.body.as_ref().map(|f| f.to_rule(Read::Text)).transpose()?,
            image: dom
                .image
                .as_ref()
                .map(|f| f.to_rule(Read::Attr("src".to_string())))
                .transpose()?,
        }),
    };

    Ok(strategy)
}
