use std::env;
use std::time::Duration;

use quillpress_core::pipeline::ExcerptLimits;
use quillpress_markup::render::{RemoteRenderer, RenderError, Renderer};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Admin login name; becomes the author of saved posts.
    pub admin_username: String,
    /// Argon2 PHC-string hash of the admin password.
    pub admin_password_hash: String,
    /// Markup rendering backend: "local" or "remote".
    pub render_backend: String,
    /// Endpoint of the remote rendering service (remote backend only).
    pub render_endpoint: String,
    /// Timeout for remote rendering calls, in seconds.
    pub render_timeout_secs: u64,
    /// Optional rendering context forwarded to the remote service.
    pub render_context: Option<String>,
    /// Word limit of a derived excerpt.
    pub excerpt_words: usize,
    /// Word limit of a derived rendered excerpt.
    pub rendered_excerpt_words: usize,
    /// Word limit of a derived meta description.
    pub description_words: usize,
    /// Posts per listing page.
    pub page_size: u32,
    /// RSS channel metadata.
    pub feed_title: String,
    pub feed_description: String,
    /// Public base URL of the site, used for feed item links.
    pub site_url: String,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3030".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            database_url: env::var("DATABASE_URL")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("DB_MAX_CONNECTIONS must be a valid u32"),
            db_min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DB_MIN_CONNECTIONS must be a valid u32"),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me-in-production".to_string()),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH").unwrap_or_default(),
            render_backend: env::var("RENDER_BACKEND").unwrap_or_else(|_| "local".to_string()),
            render_endpoint: env::var("RENDER_ENDPOINT").unwrap_or_default(),
            render_timeout_secs: env::var("RENDER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("RENDER_TIMEOUT_SECS must be a valid u64"),
            render_context: env::var("RENDER_CONTEXT").ok(),
            excerpt_words: env::var("EXCERPT_WORDS")
                .unwrap_or_else(|_| "80".to_string())
                .parse()
                .expect("EXCERPT_WORDS must be a valid usize"),
            rendered_excerpt_words: env::var("RENDERED_EXCERPT_WORDS")
                .unwrap_or_else(|_| "80".to_string())
                .parse()
                .expect("RENDERED_EXCERPT_WORDS must be a valid usize"),
            description_words: env::var("DESCRIPTION_WORDS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .expect("DESCRIPTION_WORDS must be a valid usize"),
            page_size: env::var("PAGE_SIZE")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .expect("PAGE_SIZE must be a valid u32"),
            feed_title: env::var("FEED_TITLE").unwrap_or_else(|_| "Quillpress".to_string()),
            feed_description: env::var("FEED_DESCRIPTION")
                .unwrap_or_else(|_| "Latest posts".to_string()),
            site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3030".to_string()),
            event_bus_capacity: env::var("EVENT_BUS_CAPACITY")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .expect("EVENT_BUS_CAPACITY must be a valid usize"),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn excerpt_limits(&self) -> ExcerptLimits {
        ExcerptLimits {
            excerpt_words: self.excerpt_words,
            rendered_excerpt_words: self.rendered_excerpt_words,
            description_words: self.description_words,
        }
    }

    /// Select the markup rendering backend. Anything other than "remote"
    /// falls back to the in-process renderer.
    pub fn renderer(&self) -> Result<Renderer, RenderError> {
        if self.render_backend == "remote" {
            let remote = RemoteRenderer::new(
                self.render_endpoint.clone(),
                Duration::from_secs(self.render_timeout_secs),
                self.render_context.clone(),
            )?;
            Ok(Renderer::Remote(remote))
        } else {
            Ok(Renderer::local())
        }
    }
}
