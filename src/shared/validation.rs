use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating slug fields (article and category slugs)
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "hello-world", "rust-2024", "my-first-post"
    /// - Invalid: "-post", "post-", "post--title", "Post", "post_title"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Derive a slug from free text: lowercase, non-alphanumeric runs collapse
/// to single hyphens, leading/trailing hyphens trimmed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_hyphen = true; // swallow leading separators

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("hello-world"));
        assert!(SLUG_REGEX.is_match("rust-2024"));
        assert!(SLUG_REGEX.is_match("my-first-post"));
        assert!(SLUG_REGEX.is_match("a"));
        assert!(SLUG_REGEX.is_match("abc123"));
        assert!(SLUG_REGEX.is_match("a-b-c"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("-post")); // starts with hyphen
        assert!(!SLUG_REGEX.is_match("post-")); // ends with hyphen
        assert!(!SLUG_REGEX.is_match("post--title")); // double hyphen
        assert!(!SLUG_REGEX.is_match("Post")); // uppercase
        assert!(!SLUG_REGEX.is_match("post_title")); // underscore
        assert!(!SLUG_REGEX.is_match("")); // empty
        assert!(!SLUG_REGEX.is_match("post title")); // space
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust 2024  "), "rust-2024");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("___"), "");
        assert!(SLUG_REGEX.is_match(&slugify("Some Tag Name")));
    }
}
