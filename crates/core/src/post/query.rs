//! The active-content filter.
//!
//! "Active" means published on or before the query instant and not in
//! draft mode. Privileged callers (an authenticated admin session) also
//! see drafts. Listings order by `publish_date` descending with `title`
//! ascending as the tiebreak; the SQL in the store mirrors
//! [`ActiveFilter::matches`].

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::model::PostLink;

/// Who is asking. Privileged callers see draft records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Public,
    Privileged,
}

impl Audience {
    pub fn include_drafts(self) -> bool {
        matches!(self, Audience::Privileged)
    }
}

/// Predicate for the active-content set at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct ActiveFilter {
    pub as_of: DateTime<Utc>,
    pub audience: Audience,
}

impl ActiveFilter {
    pub fn now(audience: Audience) -> Self {
        Self {
            as_of: Utc::now(),
            audience,
        }
    }

    pub fn at(as_of: DateTime<Utc>, audience: Audience) -> Self {
        Self { as_of, audience }
    }

    pub fn matches(&self, publish_date: DateTime<Utc>, draft_mode: bool) -> bool {
        publish_date <= self.as_of && (!draft_mode || self.audience.include_drafts())
    }
}

/// 1-based page selector for listings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl Page {
    pub fn offset(&self, page_size: u32) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(page_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1 }
    }
}

/// Neighbouring active posts of a detail view: next is the earliest post
/// published at or after this one, previous the latest at or before it,
/// excluding the post itself. Request-scoped, never persisted.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjacent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PostLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PostLink>,
}
