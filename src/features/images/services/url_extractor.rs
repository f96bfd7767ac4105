use std::collections::HashSet;

use regex::Regex;

use crate::core::error::{AppError, Result};

/// Scans article content for image URLs served by the CDN.
///
/// Pure and side-effect free: the same content always yields the same set.
/// The CDN is identified by its public base URL(s), supplied at construction,
/// so nothing here is tied to one hosting vendor.
pub struct UrlExtractor {
    pattern: Regex,
}

impl UrlExtractor {
    /// Build an extractor matching URLs under any of the given base URLs
    /// (e.g. `https://cdn.example.com/blog-images`).
    pub fn new(base_urls: &[String]) -> Result<Self> {
        if base_urls.is_empty() {
            return Err(AppError::Internal(
                "UrlExtractor requires at least one CDN base URL".to_string(),
            ));
        }

        let alternatives = base_urls
            .iter()
            .map(|u| regex::escape(u.trim_end_matches('/')))
            .collect::<Vec<_>>()
            .join("|");

        // A reference ends at whitespace or any delimiter that closes an
        // HTML attribute or markdown link.
        let pattern = Regex::new(&format!(r#"(?:{})/[^\s"'<>()\\]+"#, alternatives))
            .map_err(|e| AppError::Internal(format!("Invalid CDN URL pattern: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Extract the deduplicated set of CDN image URLs referenced by the
    /// content plus the optional featured-image URL. Text not matching the
    /// CDN base is ignored; empty content yields an empty set.
    pub fn extract(&self, content: &str, featured_image_url: Option<&str>) -> HashSet<String> {
        let mut urls: HashSet<String> = self
            .pattern
            .find_iter(content)
            .map(|m| m.as_str().to_string())
            .collect();

        if let Some(featured) = featured_image_url {
            if self.pattern.is_match(featured) {
                urls.insert(featured.to_string());
            }
        }

        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> UrlExtractor {
        UrlExtractor::new(&["https://cdn.example/blog".to_string()]).unwrap()
    }

    #[test]
    fn extracts_urls_from_html_content() {
        let content = r#"<p>Intro</p><img src="https://cdn.example/blog/articles/a.png" alt="">
            <img src='https://cdn.example/blog/articles/b.jpg'>"#;

        let urls = extractor().extract(content, None);

        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://cdn.example/blog/articles/a.png"));
        assert!(urls.contains("https://cdn.example/blog/articles/b.jpg"));
    }

    #[test]
    fn extracts_urls_from_markdown_content() {
        let content = "Some text ![alt](https://cdn.example/blog/articles/pic.webp) more text";

        let urls = extractor().extract(content, None);

        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://cdn.example/blog/articles/pic.webp"));
    }

    #[test]
    fn deduplicates_repeated_references() {
        let content = r#"<img src="https://cdn.example/blog/x.png">
            <img src="https://cdn.example/blog/x.png">"#;

        let urls = extractor().extract(content, None);

        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn ignores_foreign_hosts() {
        let content = r#"<img src="https://other.example/blog/x.png">
            plain https://example.com/y.png text"#;

        assert!(extractor().extract(content, None).is_empty());
    }

    #[test]
    fn empty_content_yields_empty_set() {
        assert!(extractor().extract("", None).is_empty());
    }

    #[test]
    fn includes_matching_featured_image() {
        let urls = extractor().extract("", Some("https://cdn.example/blog/hero.png"));

        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://cdn.example/blog/hero.png"));
    }

    #[test]
    fn skips_foreign_featured_image() {
        let urls = extractor().extract("", Some("https://elsewhere.example/hero.png"));

        assert!(urls.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let content = r#"<img src="https://cdn.example/blog/a.png"> and
            ![b](https://cdn.example/blog/b.png)"#;
        let ex = extractor();

        let first = ex.extract(content, None);
        let second = ex.extract(content, None);

        assert_eq!(first, second);

        // Re-extracting from the flattened first result changes nothing either
        let flattened = first.iter().cloned().collect::<Vec<_>>().join(" ");
        assert_eq!(ex.extract(&flattened, None), first);
    }

    #[test]
    fn supports_multiple_base_urls() {
        let ex = UrlExtractor::new(&[
            "https://cdn.example/blog".to_string(),
            "https://img.example/assets".to_string(),
        ])
        .unwrap();

        let content = r#"<img src="https://cdn.example/blog/a.png">
            <img src="https://img.example/assets/b.png">"#;

        assert_eq!(ex.extract(content, None).len(), 2);
    }
}
