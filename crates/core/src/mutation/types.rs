/// Admin mutation payloads.
///
/// Optional fields distinguish "unset" from "blank": anything the pipeline
/// can derive is an `Option`, and blank or whitespace-only strings are
/// normalized to `None` before derivation runs.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author-supplied fields for creating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    /// Suggested slug; derived from the title when absent.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    /// Defaults to the save instant.
    pub publish_date: Option<DateTime<Utc>>,
    pub draft_mode: bool,
    pub html_mode: bool,
    /// Tag names; missing tags are created on save.
    pub tags: Vec<String>,
}

/// Partial update. `None` leaves a field unchanged; an explicit blank
/// clears it, which re-derives the derivable fields. The slug and author
/// are deliberately absent — neither is editable after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub publish_date: Option<DateTime<Utc>>,
    pub draft_mode: Option<bool>,
    pub html_mode: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Collapse blank and whitespace-only strings to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_drops_whitespace_only_values() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("text".into())), Some("text".into()));
    }

    #[test]
    fn post_input_deserializes_camel_case_with_defaults() {
        let input: PostInput =
            serde_json::from_str(r#"{"title": "Hello", "content": "Body", "draftMode": true}"#)
                .unwrap();
        assert_eq!(input.title, "Hello");
        assert!(input.draft_mode);
        assert!(!input.html_mode);
        assert!(input.publish_date.is_none());
        assert!(input.tags.is_empty());
    }
}
