//! Tag views: the site-wide tag index (with usage counts) and the posts
//! carrying a given tag.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use quillpress_core::post::query::ActiveFilter;

use crate::auth::RequestAudience;
use crate::error::{ApiError, ApiResult};
use crate::routes::posts::{summary_json, with_tags};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/{slug}", get(posts_for_tag))
}

async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tags = state.store().all_tags().await?;
    Ok(Json(json!({ "tags": tags })))
}

async fn posts_for_tag(
    State(state): State<AppState>,
    RequestAudience(audience): RequestAudience,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let tag = state
        .store()
        .find_tag(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no such tag: {slug}")))?;

    let rows = state
        .store()
        .list_by_tag(&tag.slug, ActiveFilter::now(audience))
        .await?;
    let posts = with_tags(&state, rows).await?;

    Ok(Json(json!({
        "tag": tag,
        "posts": posts.iter().map(summary_json).collect::<Vec<_>>(),
    })))
}
