/// Field validation for author-supplied input, surfaced to the admin form
/// as field-level messages.
use thiserror::Error;

pub const MAX_TITLE_LEN: usize = 250;
pub const MAX_TAG_NAME_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong,
    #[error("content is required")]
    MissingContent,
    #[error("tag name is required")]
    MissingTagName,
    #[error("tag name exceeds {MAX_TAG_NAME_LEN} characters")]
    TagNameTooLong,
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingTitle | ValidationError::TitleTooLong => "title",
            ValidationError::MissingContent => "content",
            ValidationError::MissingTagName | ValidationError::TagNameTooLong => "tags",
        }
    }
}

/// Validate the required post fields before the pipeline runs.
pub fn validate_post_fields(title: &str, content: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    if content.trim().is_empty() {
        return Err(ValidationError::MissingContent);
    }
    Ok(())
}

pub fn validate_tag_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingTagName);
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(ValidationError::TagNameTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_post_fields() {
        assert!(validate_post_fields("Hello", "Body").is_ok());
    }

    #[test]
    fn rejects_blank_title() {
        assert!(matches!(
            validate_post_fields("   ", "Body"),
            Err(ValidationError::MissingTitle)
        ));
    }

    #[test]
    fn rejects_blank_content() {
        assert!(matches!(
            validate_post_fields("Hello", ""),
            Err(ValidationError::MissingContent)
        ));
    }

    #[test]
    fn rejects_oversized_title() {
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            validate_post_fields(&title, "Body"),
            Err(ValidationError::TitleTooLong)
        ));
    }

    #[test]
    fn errors_name_their_field() {
        assert_eq!(ValidationError::MissingTitle.field(), "title");
        assert_eq!(ValidationError::MissingContent.field(), "content");
        assert_eq!(ValidationError::TagNameTooLong.field(), "tags");
    }

    #[test]
    fn rejects_blank_tag_name() {
        assert!(matches!(
            validate_tag_name(" "),
            Err(ValidationError::MissingTagName)
        ));
    }
}
