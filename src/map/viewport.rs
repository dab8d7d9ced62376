use super::engine::{HandlerId, MapEngine, MapHandler};
use crate::models::ViewportSnapshot;

/// Republishes the engine camera as a read-only [`ViewportSnapshot`]
#[derive(Debug, Default)]
pub struct ViewportReflector {
    handlers: Vec<HandlerId>,
    snapshot: ViewportSnapshot,
}

impl ViewportReflector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> ViewportSnapshot {
        self.snapshot
    }

    /// Subscribe `on_change` to move and zoom events. Any previous subscription is
    /// dropped first.
    pub fn attach<E: MapEngine>(&mut self, engine: &E, on_change: &MapHandler) {
        self.detach(Some(engine));
        self.handlers.push(engine.on_move(on_change.clone()));
        self.handlers.push(engine.on_zoom(on_change.clone()));
    }

    pub fn detach<E: MapEngine>(&mut self, engine: Option<&E>) {
        let handlers = std::mem::take(&mut self.handlers);
        if let Some(engine) = engine {
            for handler in handlers {
                engine.off(handler);
            }
        }
    }

    /// Recompute the snapshot from the live engine state
    pub fn refresh<E: MapEngine>(&mut self, engine: &E) -> ViewportSnapshot {
        self.snapshot = engine.viewport();
        self.snapshot
    }
}
