//! Domain model and save pipeline for the blog engine: posts and tags,
//! input validation, the content-normalization pipeline run on every save,
//! the active-content filter, and the post-write event bus.

pub mod events;
pub mod mutation;
pub mod pipeline;
pub mod post;
