use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Trimmed text content with inner whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn meta_property(html: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
    html.select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// URL inside an inline `background-image: url(...)` style
pub fn style_url(style: &str) -> Option<String> {
    static STYLE_URL: OnceLock<Regex> = OnceLock::new();
    let re = STYLE_URL.get_or_init(|| {
        Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("style url regex is valid")
    });

    re.captures(style)
        .map(|caps| caps[1].trim().to_string())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<h3>\n  Patch   <b>Notes</b>\n</h3>");
        let selector = Selector::parse("h3").unwrap();
        let element = html.select(&selector).next().unwrap();
        assert_eq!(element_text(element), "Patch Notes");
    }

    #[test]
    fn test_style_url_variants() {
        assert_eq!(
            style_url("background-image: url(https://cdn.example/banner.jpg)").as_deref(),
            Some("https://cdn.example/banner.jpg")
        );
        assert_eq!(
            style_url(r#"background-image:url("//cdn.example/b.png");"#).as_deref(),
            Some("//cdn.example/b.png")
        );
        assert_eq!(style_url("color: red"), None);
    }

    #[test]
    fn test_meta_property_ignores_empty_content() {
        let html = Html::parse_document(r#"<meta property="og:image" content="  ">"#);
        assert_eq!(meta_property(&html, "og:image"), None);
    }
}
