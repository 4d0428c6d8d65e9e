//! Scene — внешний интерфейс для platform shell
//!
//! Host дёргает:
//! - `render` — раз на display refresh
//! - `step` — раз на тик 60Hz таймера (или `advance(elapsed)` если таймер неровный)
//! - `on_motion(x, y, z)` — нормализованный accelerometer sample
//! - `on_touch(x, y)` — тап в координатах view
//!
//! Всё синхронно и однопоточно с точки зрения host'а, без блокировок.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{RapierConfiguration, Sleeping};

use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::motion::MotionFilter;
use crate::registry::TileRegistry;
use crate::render::{render_tiles, GraphicsBackend, TextureSet, TextureSource};
use crate::runtime::PhysicsRuntime;
use crate::touch::handle_touch;
use crate::world::{create_headless_app, despawn_tile, spawn_boundary, spawn_grid};

/// Итог teardown'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownReport {
    pub tiles_removed: usize,
    pub textures_released: usize,
}

pub struct Scene {
    app: App,
    runtime: PhysicsRuntime,
    textures: TextureSet,
    /// Накопленное, но ещё не просимулированное время (для `advance`)
    accumulator: f32,
    torn_down: bool,
}

impl Scene {
    pub fn new(runtime: &PhysicsRuntime) -> Self {
        let config = runtime.config().clone();
        let mut app = create_headless_app(&config);

        let world = app.world_mut();
        spawn_boundary(world, &config);
        spawn_grid(world, &config);

        // Первый update: Rapier создаёт тела/коллайдеры и query pipeline
        // (плитки спят, гравитация нулевая — ничего не двигается)
        app.update();

        let live = runtime.scene_started();
        crate::logger::log_info(&format!(
            "Scene created: {} tiles ({} live scene(s))",
            config.tile_count(),
            live
        ));

        Self {
            app,
            runtime: runtime.clone(),
            textures: TextureSet::default(),
            accumulator: 0.0,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        self.app.world().resource::<SceneConfig>()
    }

    pub fn runtime(&self) -> &PhysicsRuntime {
        &self.runtime
    }

    /// Один фиксированный тик: gravity из motion → shake wake → Rapier step
    pub fn step(&mut self) {
        self.app.update();
    }

    /// Fixed-step accumulator: сколько целых тиков помещается в накопленное время,
    /// но не больше `max_catch_up_steps`; если после cap'а всё ещё отстаём
    /// (app был в фоне), накопленное время выбрасывается целиком.
    /// Возвращает число выполненных тиков.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }

        let (dt, max_steps) = {
            let config = self.config();
            (config.fixed_dt, config.max_catch_up_steps)
        };

        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= dt && steps < max_steps {
            self.accumulator -= dt;
            self.step();
            steps += 1;
        }

        if self.accumulator >= dt {
            crate::logger::log_warning(&format!(
                "Scene fell behind: dropping {:.3}s after {} catch-up step(s)",
                self.accumulator, steps
            ));
            self.accumulator = 0.0;
        }

        steps
    }

    pub fn on_motion(&mut self, x: f32, y: f32, z: f32) {
        self.app
            .world_mut()
            .resource_mut::<MotionFilter>()
            .sample(Vec3::new(x, y, z));
    }

    /// Тап: возвращает плитки, которые задел ray
    pub fn on_touch(&mut self, x: f32, y: f32) -> Vec<Entity> {
        handle_touch(self.app.world_mut(), x, y)
    }

    /// Рисует плитки; ошибка только если не загрузились текстуры
    pub fn render(
        &mut self,
        backend: &mut impl GraphicsBackend,
        source: &mut impl TextureSource,
    ) -> Result<usize, SceneError> {
        render_tiles(self.app.world(), &mut self.textures, backend, source)
    }

    /// Разбирает сцену: registry спереди назад, потом текстуры. Повторный вызов — no-op.
    pub fn teardown(&mut self, backend: &mut impl GraphicsBackend) -> TeardownReport {
        if self.torn_down {
            return TeardownReport::default();
        }

        let tiles_removed = self.drain_tiles();
        let textures_released = self.textures.release(backend);
        self.finish();

        crate::logger::log_info(&format!(
            "Scene torn down: {} tiles removed, {} textures released",
            tiles_removed, textures_released
        ));

        TeardownReport {
            tiles_removed,
            textures_released,
        }
    }

    fn drain_tiles(&mut self) -> usize {
        let world = self.app.world_mut();
        let mut removed = 0;
        while let Some(head) = world.resource::<TileRegistry>().head() {
            if despawn_tile(world, head) {
                removed += 1;
            }
        }
        removed
    }

    fn finish(&mut self) {
        if !self.torn_down {
            self.torn_down = true;
            self.runtime.scene_finished();
        }
    }

    /// Удаляет одну плитку (body + collider) из сцены
    pub fn remove_tile(&mut self, entity: Entity) -> bool {
        despawn_tile(self.app.world_mut(), entity)
    }

    pub fn tile_count(&self) -> usize {
        self.registry().len()
    }

    pub fn registry(&self) -> &TileRegistry {
        self.app.world().resource::<TileRegistry>()
    }

    /// Живые плитки в registry order
    pub fn tiles(&self) -> Vec<Entity> {
        self.registry().iter().collect()
    }

    pub fn tile_pose(&self, entity: Entity) -> Option<Transform> {
        self.app.world().get::<Transform>(entity).copied()
    }

    pub fn is_awake(&self, entity: Entity) -> Option<bool> {
        self.app
            .world()
            .get::<Sleeping>(entity)
            .map(|sleeping| !sleeping.sleeping)
    }

    pub fn awake_count(&self) -> usize {
        self.registry()
            .iter()
            .filter(|entity| self.is_awake(*entity) == Some(true))
            .count()
    }

    pub fn motion(&self) -> MotionFilter {
        *self.app.world().resource::<MotionFilter>()
    }

    /// Гравитация, с которой прошёл последний шаг
    pub fn gravity(&self) -> Option<Vec3> {
        let world = self.app.world();
        let mut query = world.try_query::<&RapierConfiguration>()?;
        query.iter(world).next().map(|configuration| configuration.gravity)
    }

    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    /// Прямой доступ к ECS миру (инспекция в тестах / debug overlay host'а)
    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }

        if !self.textures.is_empty() {
            // Без backend'а удалить GPU handle'ы нечем
            crate::logger::log_warning(&format!(
                "Scene dropped without teardown: {} texture(s) leaked",
                self.textures.len()
            ));
        }
        self.drain_tiles();
        self.finish();
    }
}
