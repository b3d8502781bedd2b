//! RSS 2.0 feed of the newest active posts.

use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use rss::{Channel, ChannelBuilder, GuidBuilder, ItemBuilder};

use quillpress_core::post::model::PostRow;
use quillpress_core::post::query::{ActiveFilter, Audience};

use crate::config::AppConfig;
use crate::error::ApiResult;
use crate::state::AppState;

/// The feed always shows the newest 10 active posts.
const FEED_ITEMS: i64 = 10;

pub fn routes() -> Router<AppState> {
    Router::new().route("/rss", get(rss_feed))
}

async fn rss_feed(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rows = state
        .store()
        .latest_active(ActiveFilter::now(Audience::Public), FEED_ITEMS)
        .await?;
    let channel = build_channel(&rows, state.config());
    Ok((
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        channel.to_string(),
    ))
}

fn build_channel(rows: &[PostRow], config: &AppConfig) -> Channel {
    let base = config.site_url.trim_end_matches('/');
    let items: Vec<rss::Item> = rows
        .iter()
        .map(|row| {
            let link = format!("{}{}", base, row.path());
            ItemBuilder::default()
                .title(row.title.clone())
                .link(Some(link.clone()))
                .guid(GuidBuilder::default().permalink(true).value(link).build())
                .description(row.rendered_excerpt.clone())
                .pub_date(row.publish_date.to_rfc2822())
                .build()
        })
        .collect();

    ChannelBuilder::default()
        .title(&config.feed_title)
        .link(config.site_url.clone())
        .description(&config.feed_description)
        .items(items)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 3030,
            database_url: String::new(),
            db_max_connections: 1,
            db_min_connections: 1,
            jwt_secret: "secret".into(),
            admin_username: "admin".into(),
            admin_password_hash: String::new(),
            render_backend: "local".into(),
            render_endpoint: String::new(),
            render_timeout_secs: 10,
            render_context: None,
            excerpt_words: 80,
            rendered_excerpt_words: 80,
            description_words: 25,
            page_size: 25,
            feed_title: "Example Blog".into(),
            feed_description: "Latest posts".into(),
            site_url: "https://example.com/".into(),
            event_bus_capacity: 16,
            log_level: "info".into(),
        }
    }

    fn row(title: &str, slug: &str) -> PostRow {
        PostRow {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: slug.into(),
            content: String::new(),
            rendered_content: String::new(),
            excerpt: String::new(),
            rendered_excerpt: "<p>teaser</p>".into(),
            description: String::new(),
            keywords: None,
            publish_date: Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
            draft_mode: false,
            html_mode: false,
            author: "admin".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn channel_carries_config_metadata() {
        let channel = build_channel(&[], &config());
        assert_eq!(channel.title(), "Example Blog");
        assert_eq!(channel.description(), "Latest posts");
        assert_eq!(channel.items().len(), 0);
    }

    #[test]
    fn items_link_to_year_scoped_urls() {
        let channel = build_channel(&[row("Hello World", "hello-world")], &config());
        let item = &channel.items()[0];
        assert_eq!(item.title(), Some("Hello World"));
        assert_eq!(item.link(), Some("https://example.com/2024/hello-world/"));
        assert_eq!(item.description(), Some("<p>teaser</p>"));
    }
}
