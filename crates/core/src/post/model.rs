use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single blog entry with its tags, as served by the API.
/// `PostRow` below is the bare `posts` table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// URL-safe identifier, unique within the publish year, immutable
    /// after creation.
    pub slug: String,
    /// Raw author markup (or HTML when `html_mode` is set).
    pub content: String,
    /// Derived HTML cache of `content`; regenerated on every save.
    pub rendered_content: String,
    pub excerpt: String,
    pub rendered_excerpt: String,
    /// Plain-text summary for search-engine metadata.
    pub description: String,
    /// Comma-joined terms, populated from tag names when left unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub draft_mode: bool,
    pub html_mode: bool,
    /// Username of the acting principal at creation; never user-editable.
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn from_row(row: PostRow, tags: Vec<Tag>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            rendered_content: row.rendered_content,
            excerpt: row.excerpt,
            rendered_excerpt: row.rendered_excerpt,
            description: row.description,
            keywords: row.keywords,
            publish_date: row.publish_date,
            draft_mode: row.draft_mode,
            html_mode: row.html_mode,
            author: row.author,
            created_at: row.created_at,
            updated_at: row.updated_at,
            tags,
        }
    }

    pub fn publish_year(&self) -> i32 {
        self.publish_date.year()
    }

    /// Canonical path of the detail view: `/{year}/{slug}/`.
    pub fn path(&self) -> String {
        format!("/{}/{}/", self.publish_year(), self.slug)
    }
}

/// Database row representation of a post. Maps to the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
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
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    pub fn publish_year(&self) -> i32 {
        self.publish_date.year()
    }

    pub fn path(&self) -> String {
        format!("/{}/{}/", self.publish_year(), self.slug)
    }

    pub fn link(&self) -> PostLink {
        PostLink {
            title: self.title.clone(),
            slug: self.slug.clone(),
            publish_date: self.publish_date,
            url: self.path(),
        }
    }
}

/// Categorization label. Tag slugs are recomputed on every save.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Lightweight pointer to a neighbouring post, used by next/previous
/// navigation on detail views. Computed per request, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLink {
    pub title: String,
    pub slug: String,
    pub publish_date: DateTime<Utc>,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn path_is_year_scoped() {
        let row = PostRow {
            id: Uuid::new_v4(),
            title: "Hello World".into(),
            slug: "hello-world".into(),
            content: String::new(),
            rendered_content: String::new(),
            excerpt: String::new(),
            rendered_excerpt: String::new(),
            description: String::new(),
            keywords: None,
            publish_date: Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
            draft_mode: false,
            html_mode: false,
            author: "admin".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(row.path(), "/2024/hello-world/");
        assert_eq!(row.link().url, "/2024/hello-world/");
    }
}
