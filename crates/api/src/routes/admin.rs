//! Authenticated admin surface: login plus post create/edit/delete.
//!
//! The author is always the authenticated principal, never a field of the
//! request body. Creates and updates run the full normalization pipeline
//! before anything touches the database, so a failed render aborts the
//! save with nothing persisted.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use quillpress_core::events::types::{BlogEvent, PostEvent, TagEvent};
use quillpress_core::mutation::types::{PostInput, PostPatch};
use quillpress_core::pipeline::{prepare_tag, NewTag};
use quillpress_core::post::model::{Post, PostRow, Tag};
use quillpress_core::post::query::Page;

use crate::auth::{self, AdminUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/posts", get(list_posts).post(create_post))
        .route(
            "/admin/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let config = state.config();
    if login.username != config.admin_username
        || !auth::verify_password(&login.password, &config.admin_password_hash)
    {
        return Err(ApiError::Unauthorized);
    }
    let token = auth::issue_token(&login.username, &config.jwt_secret)?;
    Ok(Json(json!({ "token": token })))
}

/// Editing index: every post, drafts and future-dated included.
async fn list_posts(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(page): Query<Page>,
) -> ApiResult<Json<Value>> {
    let rows = state
        .store()
        .list_all(page, state.config().page_size)
        .await?;
    let entries: Vec<Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.id,
                "title": row.title,
                "slug": row.slug,
                "url": row.path(),
                "publishDate": row.publish_date,
                "draftMode": row.draft_mode,
            })
        })
        .collect();
    Ok(Json(json!({ "posts": entries, "page": page.page })))
}

async fn get_post(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let row = state
        .store()
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no such post: {id}")))?;
    let tags = state.store().tags_for_post(id).await?;
    Ok(Json(json!({ "post": Post::from_row(row, tags) })))
}

async fn create_post(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Json(input): Json<PostInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let now = Utc::now();
    let year = input.publish_date.unwrap_or(now).year();
    let tags = prepare_tags(&input.tags)?;

    let taken = state.store().slugs_in_year(year).await?;
    let prepared = state.pipeline().prepare_create(input, &taken, now).await?;
    let (row, tags) = state
        .store()
        .create_post(&prepared, &tags, &claims.sub)
        .await?;

    publish_saved(&state, &row, &tags, now);
    tracing::info!(slug = %row.slug, author = %claims.sub, "post created");
    let post = Post::from_row(row, tags);
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

async fn update_post(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<PostPatch>,
) -> ApiResult<Json<Value>> {
    let row = state
        .store()
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no such post: {id}")))?;
    let current_tags = state.store().tags_for_post(id).await?;
    let current = Post::from_row(row, current_tags);

    let new_tags = match &patch.tags {
        Some(names) => Some(prepare_tags(names)?),
        None => None,
    };
    let prepared = state.pipeline().prepare_update(&current, patch).await?;
    let (row, tags) = state
        .store()
        .update_post(id, &prepared, new_tags.as_deref())
        .await?;

    publish_saved(&state, &row, &tags, Utc::now());
    tracing::info!(slug = %row.slug, author = %claims.sub, "post updated");
    Ok(Json(json!({ "post": Post::from_row(row, tags) })))
}

async fn delete_post(
    State(state): State<AppState>,
    AdminUser(claims): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let row = state
        .store()
        .delete_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no such post: {id}")))?;

    state
        .event_bus()
        .publish(BlogEvent::PostDeleted(post_event(&row, Utc::now())));
    tracing::info!(slug = %row.slug, author = %claims.sub, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn prepare_tags(names: &[String]) -> Result<Vec<NewTag>, ApiError> {
    names
        .iter()
        .map(|name| prepare_tag(name).map_err(ApiError::from))
        .collect()
}

fn post_event(row: &PostRow, timestamp: DateTime<Utc>) -> PostEvent {
    PostEvent {
        id: row.id,
        slug: row.slug.clone(),
        publish_year: row.publish_year(),
        draft_mode: row.draft_mode,
        timestamp,
    }
}

fn publish_saved(state: &AppState, row: &PostRow, tags: &[Tag], timestamp: DateTime<Utc>) {
    state
        .event_bus()
        .publish(BlogEvent::PostSaved(post_event(row, timestamp)));
    for tag in tags {
        state.event_bus().publish(BlogEvent::TagSaved(TagEvent {
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        }));
    }
}
