use std::sync::Arc;

use quillpress_core::events::bus::EventBus;
use quillpress_core::pipeline::SavePipeline;

use crate::config::AppConfig;
use crate::store::PgStore;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: PgStore,
    config: AppConfig,
    pipeline: SavePipeline,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(
        store: PgStore,
        config: AppConfig,
        pipeline: SavePipeline,
        event_bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                config,
                pipeline,
                event_bus,
            }),
        }
    }

    pub fn store(&self) -> &PgStore {
        &self.inner.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &SavePipeline {
        &self.inner.pipeline
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}
