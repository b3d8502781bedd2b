//! Public post views: paginated listing, year archive, and slug detail
//! with next/previous navigation.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use quillpress_core::post::model::Post;
use quillpress_core::post::query::{ActiveFilter, Audience, Page};

use crate::auth::RequestAudience;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/archive", get(archive_index))
        .route("/archive/{year}", get(archive_year))
        .route("/{slug}", get(detail))
        .route("/{year}/{slug}", get(detail_in_year))
}

/// Listing entry: enough for an index page, not the full record.
pub fn summary_json(post: &Post) -> Value {
    json!({
        "title": post.title,
        "slug": post.slug,
        "url": post.path(),
        "publishDate": post.publish_date,
        "renderedExcerpt": post.rendered_excerpt,
        "tags": post.tags,
    })
}

async fn list_posts(
    State(state): State<AppState>,
    RequestAudience(audience): RequestAudience,
    Query(page): Query<Page>,
) -> ApiResult<Json<Value>> {
    let filter = ActiveFilter::now(audience);
    let page_size = state.config().page_size;

    let rows = state.store().list_active(filter, page, page_size).await?;
    let total = state.store().count_active(filter).await?;
    let posts = with_tags(&state, rows).await?;

    let total_pages = (total.max(0) as u64).div_ceil(u64::from(page_size.max(1)));
    Ok(Json(json!({
        "posts": posts.iter().map(summary_json).collect::<Vec<_>>(),
        "page": page.page,
        "totalPages": total_pages,
        "totalPosts": total,
    })))
}

async fn archive_index(
    State(state): State<AppState>,
    RequestAudience(audience): RequestAudience,
) -> ApiResult<Json<Value>> {
    let years = state
        .store()
        .active_years(ActiveFilter::now(audience))
        .await?;
    Ok(Json(json!({ "years": years })))
}

async fn archive_year(
    State(state): State<AppState>,
    RequestAudience(audience): RequestAudience,
    Path(year): Path<String>,
) -> ApiResult<Json<Value>> {
    let year: i32 = year
        .parse()
        .map_err(|_| ApiError::NotFound(format!("no such archive year: {year}")))?;
    let rows = state
        .store()
        .list_year(year, ActiveFilter::now(audience))
        .await?;
    let posts = with_tags(&state, rows).await?;
    Ok(Json(json!({
        "year": year,
        "posts": posts.iter().map(summary_json).collect::<Vec<_>>(),
    })))
}

async fn detail(
    State(state): State<AppState>,
    RequestAudience(audience): RequestAudience,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    detail_response(&state, audience, None, &slug).await
}

async fn detail_in_year(
    State(state): State<AppState>,
    RequestAudience(audience): RequestAudience,
    Path((year, slug)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let year: i32 = year
        .parse()
        .map_err(|_| ApiError::NotFound(format!("no such post: /{year}/{slug}/")))?;
    detail_response(&state, audience, Some(year), &slug).await
}

async fn detail_response(
    state: &AppState,
    audience: Audience,
    year: Option<i32>,
    slug: &str,
) -> ApiResult<Json<Value>> {
    let filter = ActiveFilter::now(audience);
    let row = state
        .store()
        .find_by_slug(year, slug, filter)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no such post: {slug}")))?;

    // Computed once here; both navigation links reuse the same lookup for
    // the rest of the request.
    let adjacent = state.store().adjacent(&row, filter).await?;
    let tags = state.store().tags_for_post(row.id).await?;
    let post = Post::from_row(row, tags);

    Ok(Json(json!({
        "post": post,
        "url": post.path(),
        "adjacent": adjacent,
    })))
}

pub async fn with_tags(
    state: &AppState,
    rows: Vec<quillpress_core::post::model::PostRow>,
) -> ApiResult<Vec<Post>> {
    let mut posts = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = state.store().tags_for_post(row.id).await?;
        posts.push(Post::from_row(row, tags));
    }
    Ok(posts)
}
