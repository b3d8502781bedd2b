//! PostgreSQL persistence for posts and tags.
//!
//! All multi-row writes share one transaction; the pipeline has already
//! run by the time anything here executes, so a failed derivation never
//! leaves partial writes behind. Keyword population is the explicit
//! second step of a save: a narrow `UPDATE` of that one column after the
//! tag associations exist, which cannot re-trigger derivation.

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use quillpress_core::pipeline::{derive_keywords, NewTag, PreparedPost};
use quillpress_core::post::model::{PostRow, Tag};
use quillpress_core::post::query::{ActiveFilter, Adjacent, Page};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Tag with its usage count, for the tag index.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TagWithCount {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Slugs already taken in a publish year.
    pub async fn slugs_in_year(&self, year: i32) -> Result<HashSet<String>, sqlx::Error> {
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM posts WHERE date_part('year', publish_date)::int = $1",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(slugs.into_iter().collect())
    }

    /// Insert a prepared post and link its tags in one transaction.
    pub async fn create_post(
        &self,
        prepared: &PreparedPost,
        tags: &[NewTag],
        author: &str,
    ) -> Result<(PostRow, Vec<Tag>), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let id = Uuid::new_v4();
        let row: PostRow = sqlx::query_as(
            "INSERT INTO posts (id, title, slug, content, rendered_content, excerpt, \
             rendered_excerpt, description, keywords, publish_date, draft_mode, html_mode, author) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING *",
        )
        .bind(id)
        .bind(&prepared.title)
        .bind(&prepared.slug)
        .bind(&prepared.content)
        .bind(&prepared.rendered_content)
        .bind(&prepared.excerpt)
        .bind(&prepared.rendered_excerpt)
        .bind(&prepared.description)
        .bind(&prepared.keywords)
        .bind(prepared.publish_date)
        .bind(prepared.draft_mode)
        .bind(prepared.html_mode)
        .bind(author)
        .fetch_one(&mut *tx)
        .await?;

        let tags = relink_tags(&mut tx, id, tags).await?;
        let row = populate_keywords_if_absent(&mut tx, row, &tags).await?;

        tx.commit().await?;
        tracing::debug!(slug = %row.slug, "post row inserted");
        Ok((row, tags))
    }

    /// Overwrite the derived field set of an existing post. `tags` of
    /// `None` leaves the associations untouched. The slug column is
    /// deliberately not in the statement.
    pub async fn update_post(
        &self,
        id: Uuid,
        prepared: &PreparedPost,
        tags: Option<&[NewTag]>,
    ) -> Result<(PostRow, Vec<Tag>), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let row: PostRow = sqlx::query_as(
            "UPDATE posts SET title = $2, content = $3, rendered_content = $4, excerpt = $5, \
             rendered_excerpt = $6, description = $7, keywords = $8, publish_date = $9, \
             draft_mode = $10, html_mode = $11, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&prepared.title)
        .bind(&prepared.content)
        .bind(&prepared.rendered_content)
        .bind(&prepared.excerpt)
        .bind(&prepared.rendered_excerpt)
        .bind(&prepared.description)
        .bind(&prepared.keywords)
        .bind(prepared.publish_date)
        .bind(prepared.draft_mode)
        .bind(prepared.html_mode)
        .fetch_one(&mut *tx)
        .await?;

        let tags = match tags {
            Some(tags) => relink_tags(&mut tx, id, tags).await?,
            None => fetch_tags(&mut *tx, id).await?,
        };
        let row = populate_keywords_if_absent(&mut tx, row, &tags).await?;

        tx.commit().await?;
        Ok((row, tags))
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<Option<PostRow>, sqlx::Error> {
        sqlx::query_as("DELETE FROM posts WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<PostRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Look a post up by slug, optionally scoped to a publish year. The
    /// unscoped variant prefers the newest match (slugs are only unique
    /// within a year).
    pub async fn find_by_slug(
        &self,
        year: Option<i32>,
        slug: &str,
        filter: ActiveFilter,
    ) -> Result<Option<PostRow>, sqlx::Error> {
        match year {
            Some(year) => {
                sqlx::query_as(
                    "SELECT * FROM posts WHERE slug = $1 \
                     AND date_part('year', publish_date)::int = $2 \
                     AND publish_date <= $3 AND (draft_mode = FALSE OR $4)",
                )
                .bind(slug)
                .bind(year)
                .bind(filter.as_of)
                .bind(filter.audience.include_drafts())
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM posts WHERE slug = $1 \
                     AND publish_date <= $2 AND (draft_mode = FALSE OR $3) \
                     ORDER BY publish_date DESC LIMIT 1",
                )
                .bind(slug)
                .bind(filter.as_of)
                .bind(filter.audience.include_drafts())
                .fetch_optional(&self.pool)
                .await
            }
        }
    }

    pub async fn list_active(
        &self,
        filter: ActiveFilter,
        page: Page,
        page_size: u32,
    ) -> Result<Vec<PostRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM posts WHERE publish_date <= $1 AND (draft_mode = FALSE OR $2) \
             ORDER BY publish_date DESC, title ASC LIMIT $3 OFFSET $4",
        )
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .bind(i64::from(page_size))
        .bind(page.offset(page_size))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_active(&self, filter: ActiveFilter) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT count(*) FROM posts WHERE publish_date <= $1 AND (draft_mode = FALSE OR $2)",
        )
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .fetch_one(&self.pool)
        .await
    }

    /// Newest active posts, for the feed.
    pub async fn latest_active(
        &self,
        filter: ActiveFilter,
        limit: i64,
    ) -> Result<Vec<PostRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM posts WHERE publish_date <= $1 AND (draft_mode = FALSE OR $2) \
             ORDER BY publish_date DESC, title ASC LIMIT $3",
        )
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Distinct publish years of active posts, newest first.
    pub async fn active_years(&self, filter: ActiveFilter) -> Result<Vec<i32>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT date_part('year', publish_date)::int AS year FROM posts \
             WHERE publish_date <= $1 AND (draft_mode = FALSE OR $2) ORDER BY year DESC",
        )
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_year(
        &self,
        year: i32,
        filter: ActiveFilter,
    ) -> Result<Vec<PostRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM posts WHERE date_part('year', publish_date)::int = $1 \
             AND publish_date <= $2 AND (draft_mode = FALSE OR $3) \
             ORDER BY publish_date DESC, title ASC",
        )
        .bind(year)
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_by_tag(
        &self,
        tag_slug: &str,
        filter: ActiveFilter,
    ) -> Result<Vec<PostRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT p.* FROM posts p \
             JOIN post_tags pt ON pt.post_id = p.id \
             JOIN tags t ON t.id = pt.tag_id \
             WHERE t.slug = $1 AND p.publish_date <= $2 AND (p.draft_mode = FALSE OR $3) \
             ORDER BY p.publish_date DESC, p.title ASC",
        )
        .bind(tag_slug)
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .fetch_all(&self.pool)
        .await
    }

    /// Every post regardless of status, for the admin editing index.
    pub async fn list_all(&self, page: Page, page_size: u32) -> Result<Vec<PostRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM posts ORDER BY publish_date DESC, title ASC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(page_size))
        .bind(page.offset(page_size))
        .fetch_all(&self.pool)
        .await
    }

    /// Next/previous active posts around `row`, excluding the post
    /// itself. Callers compute this once per detail request.
    pub async fn adjacent(
        &self,
        row: &PostRow,
        filter: ActiveFilter,
    ) -> Result<Adjacent, sqlx::Error> {
        let next: Option<PostRow> = sqlx::query_as(
            "SELECT * FROM posts WHERE id <> $1 AND publish_date >= $2 \
             AND publish_date <= $3 AND (draft_mode = FALSE OR $4) \
             ORDER BY publish_date ASC LIMIT 1",
        )
        .bind(row.id)
        .bind(row.publish_date)
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .fetch_optional(&self.pool)
        .await?;

        let previous: Option<PostRow> = sqlx::query_as(
            "SELECT * FROM posts WHERE id <> $1 AND publish_date <= $2 \
             AND publish_date <= $3 AND (draft_mode = FALSE OR $4) \
             ORDER BY publish_date DESC LIMIT 1",
        )
        .bind(row.id)
        .bind(row.publish_date)
        .bind(filter.as_of)
        .bind(filter.audience.include_drafts())
        .fetch_optional(&self.pool)
        .await?;

        Ok(Adjacent {
            next: next.map(|r| r.link()),
            previous: previous.map(|r| r.link()),
        })
    }

    pub async fn tags_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>, sqlx::Error> {
        fetch_tags(&self.pool, post_id).await
    }

    pub async fn find_tag(&self, slug: &str) -> Result<Option<Tag>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, slug FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    /// All tags with their post counts, name-ordered.
    pub async fn all_tags(&self) -> Result<Vec<TagWithCount>, sqlx::Error> {
        sqlx::query_as(
            "SELECT t.id, t.name, t.slug, count(pt.post_id) AS post_count FROM tags t \
             LEFT JOIN post_tags pt ON pt.tag_id = t.id \
             GROUP BY t.id, t.name, t.slug ORDER BY t.name ASC",
        )
        .fetch_all(&self.pool)
        .await
    }
}

async fn fetch_tags<'e, E>(executor: E, post_id: Uuid) -> Result<Vec<Tag>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        "SELECT t.id, t.name, t.slug FROM tags t \
         JOIN post_tags pt ON pt.tag_id = t.id \
         WHERE pt.post_id = $1 ORDER BY t.name ASC",
    )
    .bind(post_id)
    .fetch_all(executor)
    .await
}

/// Replace a post's tag set. Tags are upserted by name with their slug
/// recomputed, matching the recompute-on-every-save rule for tag slugs.
async fn relink_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    tags: &[NewTag],
) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    let mut linked = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag: Tag = sqlx::query_as(
            "INSERT INTO tags (id, name, slug) VALUES ($1, $2, $3) \
             ON CONFLICT (name) DO UPDATE SET slug = EXCLUDED.slug \
             RETURNING id, name, slug",
        )
        .bind(Uuid::new_v4())
        .bind(&tag.name)
        .bind(&tag.slug)
        .fetch_one(&mut **tx)
        .await?;
        sqlx::query(
            "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(tag.id)
        .execute(&mut **tx)
        .await?;
        linked.push(tag);
    }
    Ok(linked)
}

/// The second phase of a save: fill `keywords` from tag names when the
/// field is still unset. Touches only the one column; the derivation
/// chain never re-runs here.
async fn populate_keywords_if_absent(
    tx: &mut Transaction<'_, Postgres>,
    row: PostRow,
    tags: &[Tag],
) -> Result<PostRow, sqlx::Error> {
    if row.keywords.is_some() {
        return Ok(row);
    }
    match derive_keywords(tags) {
        Some(keywords) => {
            sqlx::query_as("UPDATE posts SET keywords = $2 WHERE id = $1 RETURNING *")
                .bind(row.id)
                .bind(keywords)
                .fetch_one(&mut **tx)
                .await
        }
        None => Ok(row),
    }
}
