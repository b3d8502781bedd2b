//! Slug transforms.
//!
//! Post slugs are derived from the title once, at creation, and then kept
//! stable forever so published URLs survive edits. Uniqueness is scoped to
//! the publish year; the caller supplies the set of slugs already taken in
//! that year. Tag slugs use a stricter character filter and are recomputed
//! on every tag save.

use std::collections::HashSet;

use deunicode::deunicode;

/// URL-safe identifier from a title: lowercase, non-alphanumeric runs
/// collapsed to a single dash, trimmed.
pub fn slugify(title: &str) -> String {
    slug::slugify(title)
}

/// Disambiguate `candidate` against the slugs already taken in the same
/// publish year by suffixing the first unused integer counter ≥ 2.
pub fn resolve_unique(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    let mut counter = 2u32;
    loop {
        let slug = format!("{candidate}-{counter}");
        if !taken.contains(&slug) {
            return slug;
        }
        counter += 1;
    }
}

/// Tag slug: trailing commas and spaces trimmed, ASCII-folded, lowercased,
/// spaces collapsed to dashes, everything outside `[a-z0-9-_+:.]` dropped.
pub fn tag_slug(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches([',', ' ']);
    let folded = deunicode(trimmed).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut last_dash = false;
    for c in folded.chars() {
        let mapped = match c {
            ' ' => Some('-'),
            c if c.is_ascii_alphanumeric() => Some(c),
            '-' | '_' | '+' | ':' | '.' => Some(c),
            _ => None,
        };
        if let Some(c) = mapped {
            // Collapse runs of separators produced by folded spaces.
            if c == '-' && last_dash {
                continue;
            }
            last_dash = c == '-';
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust 2024: What's New?  "), "rust-2024-what-s-new");
    }

    #[test]
    fn resolve_unique_passes_through_free_slug() {
        let taken = HashSet::new();
        assert_eq!(resolve_unique("hello-world", &taken), "hello-world");
    }

    #[test]
    fn resolve_unique_suffixes_first_free_counter() {
        let taken: HashSet<String> = ["hello-world", "hello-world-2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(resolve_unique("hello-world", &taken), "hello-world-3");
    }

    #[test]
    fn resolve_unique_is_deterministic() {
        let taken: HashSet<String> = ["post"].into_iter().map(String::from).collect();
        assert_eq!(resolve_unique("post", &taken), resolve_unique("post", &taken));
    }

    #[test]
    fn tag_slug_folds_and_filters() {
        assert_eq!(tag_slug("Café Culture"), "cafe-culture");
        assert_eq!(tag_slug("c++"), "c++");
        assert_eq!(tag_slug("web: dev, "), "web:-dev");
        assert_eq!(tag_slug("rust_lang"), "rust_lang");
    }

    #[test]
    fn tag_slug_drops_disallowed_characters() {
        assert_eq!(tag_slug("50% off!"), "50-off");
    }
}
