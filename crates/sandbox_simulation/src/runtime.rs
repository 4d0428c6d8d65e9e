//! PhysicsRuntime — явный reference-counted handle вместо глобального init/shutdown
//!
//! Host создаёт runtime один раз (process или test fixture scope) и строит сцены от него.
//! Каждая живая сцена держит clone handle'а; последняя ушедшая сцена + сам runtime
//! закрывают его (лог shutdown в Drop внутреннего состояния).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::SceneConfig;
use crate::error::SceneError;

#[derive(Debug)]
struct RuntimeInner {
    config: SceneConfig,
    live_scenes: AtomicUsize,
    scenes_created: AtomicUsize,
}

impl Drop for RuntimeInner {
    fn drop(&mut self) {
        crate::logger::log_info(&format!(
            "Physics runtime shutdown ({} scene(s) created)",
            self.scenes_created.load(Ordering::Relaxed)
        ));
    }
}

#[derive(Debug, Clone)]
pub struct PhysicsRuntime {
    inner: Arc<RuntimeInner>,
}

impl PhysicsRuntime {
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        crate::logger::init_logger();
        crate::logger::log_info("Physics runtime started");

        Ok(Self {
            inner: Arc::new(RuntimeInner {
                config,
                live_scenes: AtomicUsize::new(0),
                scenes_created: AtomicUsize::new(0),
            }),
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.inner.config
    }

    /// Сколько сцен сейчас живо на этом runtime
    pub fn live_scenes(&self) -> usize {
        self.inner.live_scenes.load(Ordering::Relaxed)
    }

    /// Сколько держателей handle'а (runtime + сцены)
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub(crate) fn scene_started(&self) -> usize {
        self.inner.scenes_created.fetch_add(1, Ordering::Relaxed);
        self.inner.live_scenes.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn scene_finished(&self) -> usize {
        let previous = self
            .inner
            .live_scenes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                Some(count.saturating_sub(1))
            })
            .unwrap_or(0);
        previous.saturating_sub(1)
    }
}
