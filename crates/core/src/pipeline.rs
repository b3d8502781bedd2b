//! The content-normalization pipeline, run on every create and update.
//!
//! Ordered derivations: render `content` to `rendered_content` (always),
//! derive or render the excerpt pair, derive the meta description when
//! absent, and resolve a year-unique slug (creation only). Keyword
//! derivation from tags needs a persisted identity and therefore lives in
//! the store as an explicit second step; [`derive_keywords`] is the pure
//! half of it.
//!
//! Rendering failure aborts the whole save before anything is persisted,
//! so `content` and `rendered_content` can never diverge.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use quillpress_markup::render::{RenderError, Renderer};
use quillpress_markup::slug as slugs;
use quillpress_markup::truncate;

use crate::mutation::types::{non_blank, PostInput, PostPatch};
use crate::post::model::{Post, Tag};
use crate::post::validate::{self, ValidationError};

/// Word limits for the derived fields. Deployment configuration, not
/// per-call-site constants.
#[derive(Debug, Clone, Copy)]
pub struct ExcerptLimits {
    /// Words kept when deriving `excerpt` from raw content.
    pub excerpt_words: usize,
    /// Words kept when deriving `rendered_excerpt` from rendered content.
    pub rendered_excerpt_words: usize,
    /// Words kept in the meta description.
    pub description_words: usize,
}

impl Default for ExcerptLimits {
    fn default() -> Self {
        Self {
            excerpt_words: 80,
            rendered_excerpt_words: 80,
            description_words: 25,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Field set with every derivation applied, ready to persist atomically.
#[derive(Debug, Clone)]
pub struct PreparedPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub rendered_content: String,
    pub excerpt: String,
    pub rendered_excerpt: String,
    pub description: String,
    pub keywords: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub draft_mode: bool,
    pub html_mode: bool,
}

/// Validated, slugged tag ready to upsert.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
}

pub struct SavePipeline {
    renderer: Renderer,
    limits: ExcerptLimits,
}

impl SavePipeline {
    pub fn new(renderer: Renderer, limits: ExcerptLimits) -> Self {
        Self { renderer, limits }
    }

    pub fn limits(&self) -> ExcerptLimits {
        self.limits
    }

    /// Run the full derivation chain for a new record. `taken_slugs` holds
    /// the slugs already used in the record's publish year.
    pub async fn prepare_create(
        &self,
        input: PostInput,
        taken_slugs: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<PreparedPost, PipelineError> {
        validate::validate_post_fields(&input.title, &input.content)?;

        let publish_date = input.publish_date.unwrap_or(now);
        let html_mode = input.html_mode;
        let rendered_content = self.renderer.render(&input.content, html_mode).await?;

        let (excerpt, rendered_excerpt) = self
            .excerpt_pair(
                non_blank(input.excerpt),
                &input.content,
                &rendered_content,
                html_mode,
            )
            .await?;

        let description = match non_blank(input.description) {
            Some(description) => description,
            None => self.derive_description(&rendered_content),
        };

        let candidate = match non_blank(input.slug) {
            Some(suggested) => slugs::slugify(&suggested),
            None => slugs::slugify(&input.title),
        };
        let slug = slugs::resolve_unique(&candidate, taken_slugs);
        tracing::debug!(%slug, "slug resolved for new post");

        Ok(PreparedPost {
            title: input.title,
            slug,
            content: input.content,
            rendered_content,
            excerpt,
            rendered_excerpt,
            description,
            keywords: non_blank(input.keywords),
            publish_date,
            draft_mode: input.draft_mode,
            html_mode,
        })
    }

    /// Re-run derivation for an edit. The slug is carried over untouched —
    /// re-deriving it would break previously issued URLs — and the excerpt
    /// is re-rendered only when its source text actually changed, which
    /// bounds call volume against a remote renderer.
    pub async fn prepare_update(
        &self,
        current: &Post,
        patch: PostPatch,
    ) -> Result<PreparedPost, PipelineError> {
        let title = patch.title.unwrap_or_else(|| current.title.clone());
        let content = patch.content.unwrap_or_else(|| current.content.clone());
        let html_mode = patch.html_mode.unwrap_or(current.html_mode);
        let draft_mode = patch.draft_mode.unwrap_or(current.draft_mode);
        let publish_date = patch.publish_date.unwrap_or(current.publish_date);
        validate::validate_post_fields(&title, &content)?;

        let rendered_content = self.renderer.render(&content, html_mode).await?;

        let requested_excerpt = match patch.excerpt {
            None => non_blank(Some(current.excerpt.clone())),
            Some(value) => non_blank(Some(value)),
        };
        let (excerpt, rendered_excerpt) = match requested_excerpt {
            None => {
                self.excerpt_pair(None, &content, &rendered_content, html_mode)
                    .await?
            }
            Some(text) if text == current.excerpt && html_mode == current.html_mode => {
                (text, current.rendered_excerpt.clone())
            }
            Some(text) => {
                let rendered = self.renderer.render(&text, html_mode).await?;
                (text, rendered)
            }
        };

        let description = match patch.description {
            None => non_blank(Some(current.description.clone())),
            Some(value) => non_blank(Some(value)),
        };
        let description = match description {
            Some(description) => description,
            None => self.derive_description(&rendered_content),
        };

        let keywords = match patch.keywords {
            None => current.keywords.clone(),
            Some(value) => non_blank(Some(value)),
        };

        Ok(PreparedPost {
            title,
            slug: current.slug.clone(),
            content,
            rendered_content,
            excerpt,
            rendered_excerpt,
            description,
            keywords,
            publish_date,
            draft_mode,
            html_mode,
        })
    }

    /// Author-supplied excerpts are rendered the same way the content is.
    /// A derived excerpt is cut from the raw markup; cutting markup can
    /// leave constructs open, so its rendered counterpart is cut from the
    /// already-rendered content instead of rendering the truncation.
    async fn excerpt_pair(
        &self,
        excerpt: Option<String>,
        content: &str,
        rendered_content: &str,
        html_mode: bool,
    ) -> Result<(String, String), PipelineError> {
        match excerpt {
            Some(text) => {
                let rendered = self.renderer.render(&text, html_mode).await?;
                Ok((text, rendered))
            }
            None => Ok((
                truncate::truncate_html_words(content, self.limits.excerpt_words),
                truncate::truncate_html_words(rendered_content, self.limits.rendered_excerpt_words),
            )),
        }
    }

    fn derive_description(&self, rendered_content: &str) -> String {
        let text = truncate::strip_tags(rendered_content);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        truncate::truncate_words(&text, self.limits.description_words)
    }
}

/// Comma-joined tag names for the keywords field. An empty tag set yields
/// `None` so a later save can still populate the field once tags exist.
pub fn derive_keywords(tags: &[Tag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Validate and slug a tag name. Unlike post slugs, tag slugs are
/// recomputed on every save.
pub fn prepare_tag(name: &str) -> Result<NewTag, ValidationError> {
    let name = name.trim();
    validate::validate_tag_name(name)?;
    Ok(NewTag {
        name: name.to_string(),
        slug: slugs::tag_slug(name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn pipeline() -> SavePipeline {
        SavePipeline::new(Renderer::local(), ExcerptLimits::default())
    }

    fn january(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn persisted(prepared: PreparedPost) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: prepared.title,
            slug: prepared.slug,
            content: prepared.content,
            rendered_content: prepared.rendered_content,
            excerpt: prepared.excerpt,
            rendered_excerpt: prepared.rendered_excerpt,
            description: prepared.description,
            keywords: prepared.keywords,
            publish_date: prepared.publish_date,
            draft_mode: prepared.draft_mode,
            html_mode: prepared.html_mode,
            author: "admin".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_derives_every_optional_field() {
        let input = PostInput {
            title: "Hello World".into(),
            content: "# Hi\n\nBody text.".into(),
            excerpt: Some(String::new()),
            description: Some(String::new()),
            publish_date: Some(january(10)),
            ..Default::default()
        };
        let prepared = pipeline()
            .prepare_create(input, &HashSet::new(), january(10))
            .await
            .unwrap();

        assert_eq!(prepared.slug, "hello-world");
        assert!(prepared.rendered_content.contains("<h1>Hi</h1>"));
        assert!(!prepared.excerpt.is_empty());
        assert!(!prepared.rendered_excerpt.is_empty());
        assert!(!prepared.description.is_empty());
        assert!(prepared.description.split_whitespace().count() <= 25);
        assert!(!prepared.description.contains('<'));
        assert!(prepared.keywords.is_none());
    }

    #[tokio::test]
    async fn duplicate_title_in_year_gets_counter_suffix() {
        let taken: HashSet<String> = ["hello-world".to_string()].into_iter().collect();
        let input = PostInput {
            title: "Hello World".into(),
            content: "Body".into(),
            ..Default::default()
        };
        let prepared = pipeline()
            .prepare_create(input, &taken, january(11))
            .await
            .unwrap();
        assert_eq!(prepared.slug, "hello-world-2");
    }

    #[tokio::test]
    async fn html_mode_copies_content_verbatim() {
        let input = PostInput {
            title: "Raw".into(),
            content: "<p>Raw</p>".into(),
            html_mode: true,
            ..Default::default()
        };
        let prepared = pipeline()
            .prepare_create(input, &HashSet::new(), january(1))
            .await
            .unwrap();
        assert_eq!(prepared.rendered_content, "<p>Raw</p>");
    }

    #[tokio::test]
    async fn authored_excerpt_is_rendered_not_truncated() {
        let input = PostInput {
            title: "Post".into(),
            content: "Body text.".into(),
            excerpt: Some("A *short* teaser".into()),
            ..Default::default()
        };
        let prepared = pipeline()
            .prepare_create(input, &HashSet::new(), january(1))
            .await
            .unwrap();
        assert_eq!(prepared.excerpt, "A *short* teaser");
        assert!(prepared.rendered_excerpt.contains("<em>short</em>"));
    }

    #[tokio::test]
    async fn derived_excerpt_is_bounded() {
        let content = (0..200).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let input = PostInput {
            title: "Long".into(),
            content,
            ..Default::default()
        };
        let pipeline = SavePipeline::new(
            Renderer::local(),
            ExcerptLimits {
                excerpt_words: 10,
                rendered_excerpt_words: 10,
                description_words: 5,
            },
        );
        let prepared = pipeline
            .prepare_create(input, &HashSet::new(), january(1))
            .await
            .unwrap();
        assert!(prepared.excerpt.split_whitespace().count() <= 11);
        assert!(prepared.description.split_whitespace().count() <= 6);
    }

    #[tokio::test]
    async fn update_keeps_excerpt_cache_when_text_unchanged() {
        let create = PostInput {
            title: "Post".into(),
            content: "First body".into(),
            excerpt: Some("Teaser".into()),
            ..Default::default()
        };
        let current = persisted(
            pipeline()
                .prepare_create(create, &HashSet::new(), january(1))
                .await
                .unwrap(),
        );
        let patch = PostPatch {
            content: Some("Second body, rewritten.".into()),
            ..Default::default()
        };
        let updated = pipeline().prepare_update(&current, patch).await.unwrap();

        assert!(updated.rendered_content.contains("Second body"));
        assert_eq!(updated.excerpt, current.excerpt);
        assert_eq!(updated.rendered_excerpt, current.rendered_excerpt);
    }

    #[tokio::test]
    async fn update_with_blanked_excerpt_rederives_from_new_content() {
        let create = PostInput {
            title: "Post".into(),
            content: "First body".into(),
            excerpt: Some("Teaser".into()),
            ..Default::default()
        };
        let current = persisted(
            pipeline()
                .prepare_create(create, &HashSet::new(), january(1))
                .await
                .unwrap(),
        );
        let patch = PostPatch {
            content: Some("Fresh content here".into()),
            excerpt: Some(String::new()),
            ..Default::default()
        };
        let updated = pipeline().prepare_update(&current, patch).await.unwrap();
        assert!(updated.excerpt.contains("Fresh content"));
    }

    #[tokio::test]
    async fn update_never_touches_slug_or_authored_description() {
        let create = PostInput {
            title: "Stable".into(),
            content: "Body".into(),
            description: Some("Hand-written summary".into()),
            ..Default::default()
        };
        let current = persisted(
            pipeline()
                .prepare_create(create, &HashSet::new(), january(1))
                .await
                .unwrap(),
        );
        let patch = PostPatch {
            title: Some("Renamed Entirely".into()),
            content: Some("New body".into()),
            ..Default::default()
        };
        let updated = pipeline().prepare_update(&current, patch).await.unwrap();
        assert_eq!(updated.slug, "stable");
        assert_eq!(updated.description, "Hand-written summary");
    }

    #[tokio::test]
    async fn update_rerenders_when_html_mode_flips() {
        let create = PostInput {
            title: "Post".into(),
            content: "*emphasis*".into(),
            excerpt: Some("*teaser*".into()),
            ..Default::default()
        };
        let current = persisted(
            pipeline()
                .prepare_create(create, &HashSet::new(), january(1))
                .await
                .unwrap(),
        );
        assert!(current.rendered_excerpt.contains("<em>"));

        let patch = PostPatch {
            html_mode: Some(true),
            ..Default::default()
        };
        let updated = pipeline().prepare_update(&current, patch).await.unwrap();
        assert_eq!(updated.rendered_content, "*emphasis*");
        assert_eq!(updated.rendered_excerpt, "*teaser*");
    }

    #[tokio::test]
    async fn blank_title_fails_validation() {
        let input = PostInput {
            title: "  ".into(),
            content: "Body".into(),
            ..Default::default()
        };
        let err = pipeline()
            .prepare_create(input, &HashSet::new(), january(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::MissingTitle)
        ));
    }

    #[test]
    fn keywords_join_tag_names() {
        let tags = vec![
            Tag {
                id: Uuid::new_v4(),
                name: "rust".into(),
                slug: "rust".into(),
            },
            Tag {
                id: Uuid::new_v4(),
                name: "web dev".into(),
                slug: "web-dev".into(),
            },
        ];
        assert_eq!(derive_keywords(&tags), Some("rust, web dev".into()));
        assert_eq!(derive_keywords(&[]), None);
    }

    #[test]
    fn prepare_tag_slugs_and_validates() {
        let tag = prepare_tag(" Café Culture ").unwrap();
        assert_eq!(tag.name, "Café Culture");
        assert_eq!(tag.slug, "cafe-culture");
        assert!(prepare_tag("  ").is_err());
    }
}
