//! Markup rendering backends.
//!
//! The engine stores raw author markup next to a rendered-HTML cache and
//! regenerates the cache on every save. Two backends exist, selected by
//! deployment configuration:
//!
//! - [`LocalRenderer`]: in-process markdown via pulldown-cmark with pipe
//!   tables enabled. Fenced code blocks keep their info string as a
//!   `language-*` class for client-side highlighting, and intra-word
//!   underscores are never emphasis.
//! - [`RemoteRenderer`]: HTTP POST to a rendering service with a JSON
//!   body `{text, mode, context}`, response body is the rendered HTML.

use std::time::Duration;

use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The rendering call failed or timed out. Saves must not proceed
    /// with a stale `rendered_content`.
    #[error("markup rendering unavailable: {0}")]
    Unavailable(String),
}

/// In-process markdown renderer.
#[derive(Debug, Clone)]
pub struct LocalRenderer {
    options: Options,
}

impl LocalRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        Self { options }
    }

    pub fn render(&self, markup: &str) -> String {
        let parser = Parser::new_ext(markup, self.options);
        let mut out = String::with_capacity(markup.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

impl Default for LocalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    text: &'a str,
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

/// Client for a remote markdown-rendering endpoint.
#[derive(Debug, Clone)]
pub struct RemoteRenderer {
    client: reqwest::Client,
    endpoint: String,
    context: Option<String>,
}

impl RemoteRenderer {
    /// `context` is forwarded verbatim to the service (some renderers use
    /// it to resolve bare issue/commit references).
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        context: Option<String>,
    ) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            context,
        })
    }

    pub async fn render(&self, markup: &str) -> Result<String, RenderError> {
        let body = RenderRequest {
            text: markup,
            mode: "markdown",
            context: self.context.as_deref(),
        };
        tracing::debug!(endpoint = %self.endpoint, bytes = markup.len(), "rendering markup remotely");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;
        response
            .text()
            .await
            .map_err(|e| RenderError::Unavailable(e.to_string()))
    }
}

/// Rendering capability with swappable backends.
#[derive(Debug, Clone)]
pub enum Renderer {
    Local(LocalRenderer),
    Remote(RemoteRenderer),
}

impl Renderer {
    pub fn local() -> Self {
        Renderer::Local(LocalRenderer::new())
    }

    /// Render author markup to HTML. When `html_mode` is set the input is
    /// already HTML and is returned unchanged.
    pub async fn render(&self, markup: &str, html_mode: bool) -> Result<String, RenderError> {
        if html_mode {
            return Ok(markup.to_string());
        }
        match self {
            Renderer::Local(renderer) => Ok(renderer.render(markup)),
            Renderer::Remote(renderer) => renderer.render(markup).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings() {
        let html = LocalRenderer::new().render("# Hi\n\nBody text.");
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<p>Body text.</p>"));
    }

    #[test]
    fn fenced_code_keeps_language_hint() {
        let html = LocalRenderer::new().render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre><code class=\"language-rust\">"));
    }

    #[test]
    fn pipe_tables_enabled() {
        let html = LocalRenderer::new().render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn intra_word_underscores_are_not_emphasis() {
        let html = LocalRenderer::new().render("call foo_bar_baz here");
        assert!(html.contains("foo_bar_baz"));
        assert!(!html.contains("<em>"));
    }

    #[tokio::test]
    async fn html_mode_is_verbatim_passthrough() {
        let renderer = Renderer::local();
        let out = renderer.render("<p>Raw</p>", true).await.unwrap();
        assert_eq!(out, "<p>Raw</p>");
    }

    #[tokio::test]
    async fn remote_failure_reports_unavailable() {
        // Nothing listens on this port.
        let renderer = RemoteRenderer::new(
            "http://127.0.0.1:9/render",
            Duration::from_millis(200),
            None,
        )
        .unwrap();
        let err = renderer.render("# Hi").await.unwrap_err();
        assert!(matches!(err, RenderError::Unavailable(_)));
    }
}
