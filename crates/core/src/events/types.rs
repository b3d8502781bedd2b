use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted after successful writes, consumed by in-process
/// listeners (cache invalidation, live admin views).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlogEvent {
    PostSaved(PostEvent),
    PostDeleted(PostEvent),
    TagSaved(TagEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEvent {
    pub id: Uuid,
    pub slug: String,
    pub publish_year: i32,
    pub draft_mode: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagEvent {
    pub name: String,
    pub slug: String,
}
