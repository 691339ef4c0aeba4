use std::fmt;

use serde::{Deserialize, Serialize};

use super::Author;

/// Opaque identifier of "the latest item". Compared by equality only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeKey(String);

impl ChangeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ChangeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ChangeKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyFormat {
    #[default]
    Plain,
    /// Body still carries embedded markup tags.
    Markup,
}

/// Normalized content of the latest item, rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title: String,
    pub body: String,
    pub body_format: BodyFormat,
    pub link: String,
    pub image_url: Option<String>,
    pub author: Option<Author>,
}

impl ContentRecord {
    pub fn new(link: String) -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            body_format: BodyFormat::Plain,
            link,
            image_url: None,
            author: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.unwrap_or_default();
        self
    }

    pub fn with_body(mut self, body: Option<String>, format: BodyFormat) -> Self {
        self.body = body.unwrap_or_default();
        self.body_format = format;
        self
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn with_author(mut self, author: Option<Author>) -> Self {
        self.author = author;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_key_trims() {
        let key = ChangeKey::new("  /news/patch-1  ");
        assert_eq!(key.as_str(), "/news/patch-1");
        assert!(!key.is_empty());
        assert!(ChangeKey::new("   ").is_empty());
    }

    #[test]
    fn test_record_builder_defaults() {
        let record = ContentRecord::new("https://example.com/a".to_string())
            .with_title(None)
            .with_image(Some(" ".to_string()));

        assert_eq!(record.title, "");
        assert_eq!(record.body, "");
        assert_eq!(record.body_format, BodyFormat::Plain);
        assert!(record.image_url.is_none());
    }
}
