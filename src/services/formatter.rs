use scraper::Html;

use crate::domain::{BodyFormat, ContentRecord, ImagePlacement, Notification, SourceDescriptor};

/// Longest body a notification carries, ellipsis included.
pub const MAX_BODY_CHARS: usize = 250;
/// Chat embed title limit.
pub const MAX_TITLE_CHARS: usize = 256;
const ELLIPSIS: &str = "...";

/// Image URLs containing any of these are generic stock logos.
pub const PLACEHOLDER_IMAGE_MARKERS: &[&str] = &["share_steam_logo"];

/// Maps content records into bounded notifications.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    placeholder_markers: Vec<String>,
}

impl MessageFormatter {
    pub fn new() -> Self {
        Self {
            placeholder_markers: PLACEHOLDER_IMAGE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    pub fn with_placeholder_marker(mut self, marker: &str) -> Self {
        self.placeholder_markers.push(marker.to_string());
        self
    }

    pub fn is_placeholder(&self, image_url: &str) -> bool {
        self.placeholder_markers
            .iter()
            .any(|marker| image_url.contains(marker.as_str()))
    }

    fn keep_image(&self, image_url: Option<&String>) -> Option<String> {
        image_url.filter(|url| !self.is_placeholder(url)).cloned()
    }

    pub fn format(&self, record: &ContentRecord, source: &SourceDescriptor) -> Notification {
        let body = match record.body_format {
            BodyFormat::Markup => strip_markup(&record.body),
            BodyFormat::Plain => record.body.trim().to_string(),
        };

        let image = self.keep_image(record.image_url.as_ref());
        let branding = self.keep_image(source.thumbnail_url.as_ref());
        let (image, thumbnail) = match source.image_placement {
            ImagePlacement::Image => (image, branding),
            ImagePlacement::Thumbnail => (None, image.or(branding)),
        };

        Notification {
            source_label: source.label.clone(),
            emoji: source.emoji.clone(),
            title: truncate(record.title.trim(), MAX_TITLE_CHARS),
            body: truncate(&body, MAX_BODY_CHARS),
            link: record.link.clone(),
            color: source.color,
            image,
            thumbnail,
            author: record.author.clone().or_else(|| source.author.clone()),
            footer: source.footer.clone(),
        }
    }
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Text content of an HTML fragment, whitespace collapsed
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();

    for node in fragment.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
        }
        // Block elements separate words
        if let Some(element) = node.value().as_element() {
            if matches!(element.name(), "p" | "br" | "div" | "li" | "h1" | "h2" | "h3" | "h4") {
                text.push(' ');
            }
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut to at most `max_chars` characters, the last three being "..." when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
