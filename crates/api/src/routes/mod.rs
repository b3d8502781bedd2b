pub mod admin;
pub mod feed;
pub mod health;
pub mod posts;
pub mod tags;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router. Static segments (`/archive`, `/tags`,
/// `/rss`, `/health`, `/admin`) take precedence over the slug captures
/// in the post routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(feed::routes())
        .merge(tags::routes())
        .merge(admin::routes())
        .merge(posts::routes())
        .with_state(state)
}
