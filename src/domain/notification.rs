use super::{Author, Footer};

/// Destination-agnostic payload produced by the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub source_label: String,
    pub emoji: Option<String>,
    pub title: String,
    pub body: String,
    pub link: String,
    pub color: u32,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<Author>,
    pub footer: Option<Footer>,
}

impl Notification {
    /// Plain-text rendering: "{emoji} {label}: {title} - {body} {link}"
    pub fn format(&self) -> String {
        let mut message = match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.source_label),
            None => self.source_label.clone(),
        };

        if !self.title.is_empty() {
            message.push_str(": ");
            message.push_str(&self.title);
        }

        if !self.body.is_empty() {
            message.push_str(" - ");
            message.push_str(&self.body);
        }

        if !self.link.is_empty() {
            message.push(' ');
            message.push_str(&self.link);
        }

        message
    }
}
