//! Scene integration test
//!
//! Полный headless стек: Bevy MinimalPlugins + Rapier + сцена.
//!
//! Проверяем:
//! - lifecycle (runtime handle, teardown, несколько сцен)
//! - motion → gravity
//! - touch будит ровно задетую плитку
//! - render: 16 draw'ов, текстуры грузятся один раз, teardown их отпускает
//! - fixed-step accumulator

use bevy::prelude::*;
use sandbox_simulation::motion::MAX_WOKEN_PER_SHAKE;
use sandbox_simulation::*;

/// Backend-заглушка: пишет все вызовы
#[derive(Default)]
struct RecordingBackend {
    frames: usize,
    binds: Vec<TextureHandle>,
    draws: Vec<Mat4>,
    deleted: Vec<TextureHandle>,
    pending_errors: Vec<u32>,
}

impl GraphicsBackend for RecordingBackend {
    fn poll_error(&mut self) -> Option<u32> {
        self.pending_errors.pop()
    }

    fn begin_frame(&mut self, _frame: &FrameSetup) {
        self.frames += 1;
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        self.binds.push(texture);
    }

    fn draw_mesh(&mut self, model: Mat4, mesh: &CubeMesh) {
        assert_eq!(mesh.indices.len(), 36);
        self.draws.push(model);
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.deleted.push(texture);
    }
}

/// Source-заглушка: handle = порядковый номер загрузки (с 100)
#[derive(Default)]
struct CountingSource {
    loads: usize,
    fail: bool,
}

impl TextureSource for CountingSource {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, String> {
        if self.fail {
            return Err(format!("no asset named {}", name));
        }
        self.loads += 1;
        Ok(TextureHandle(100 + self.loads as u32))
    }
}

fn runtime() -> PhysicsRuntime {
    PhysicsRuntime::new(SceneConfig::default()).expect("default config is valid")
}

/// Координаты тапа (view, y вниз) по центру плитки (col, row)
fn tap_on_tile(config: &SceneConfig, column: u32, row: u32) -> (f32, f32) {
    let center = config.tile_position(column, row);
    (center.x + config.view_half_width, config.view_half_height - center.y)
}

#[test]
fn test_scene_starts_with_sleeping_grid() {
    let runtime = runtime();
    let scene = Scene::new(&runtime);

    assert_eq!(scene.tile_count(), 16);
    assert_eq!(scene.awake_count(), 0);
    assert_eq!(runtime.live_scenes(), 1);

    // Спящие плитки не двигаются после первого update
    for entity in scene.tiles() {
        let tile = *scene.world().get::<Tile>(entity).expect("tile");
        let pose = scene.tile_pose(entity).expect("pose");
        assert_eq!(pose.translation, scene.config().tile_position(tile.column, tile.row));
    }
}

#[test]
fn test_motion_drives_gravity() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);

    scene.on_motion(1.0, 0.0, 0.0);
    let motion = scene.motion();
    assert!((motion.lowpass.x - 0.1).abs() < 1e-6);
    assert!((motion.highpass.x - 0.9).abs() < 1e-6);

    scene.step();

    let gravity = scene.gravity().expect("rapier configuration");
    let expected = (0.1 * 1.0 + 0.9 * 10.0) * 6300.0;
    assert!((gravity.x - expected).abs() < 0.5, "gravity = {:?}", gravity);
    assert_eq!(gravity.y, 0.0);
    assert_eq!(gravity.z, 0.0);

    // 0.81 < 1.0 — не shake, никто не проснулся
    assert_eq!(scene.awake_count(), 0);
}

#[test]
fn test_touch_wakes_exactly_one_tile() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let (x, y) = tap_on_tile(scene.config(), 1, 2);

    let hits = scene.on_touch(x, y);
    assert_eq!(hits.len(), 1);

    let tile = *scene.world().get::<Tile>(hits[0]).expect("tile");
    assert_eq!((tile.column, tile.row), (1, 2));

    for entity in scene.tiles() {
        assert_eq!(scene.is_awake(entity), Some(entity == hits[0]));
    }
}

#[test]
fn test_touch_kick_moves_tile_up() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let (x, y) = tap_on_tile(scene.config(), 0, 3);

    let hits = scene.on_touch(x, y);
    assert_eq!(hits.len(), 1);
    let before = scene.tile_pose(hits[0]).expect("pose").translation;

    scene.step();

    let after = scene.tile_pose(hits[0]).expect("pose").translation;
    assert!(after.y > before.y, "kick should push the tile up: {:?} -> {:?}", before, after);
}

#[test]
fn test_touch_between_tiles_hits_nothing() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);

    // Зазор между колонками 0 и 1 (x = -75.5 в мире)
    let hits = scene.on_touch(84.5, 61.5);
    assert!(hits.is_empty());
    assert_eq!(scene.awake_count(), 0);
}

#[test]
fn test_shake_wakes_at_most_three_per_step() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);

    scene.on_motion(0.0, 0.0, 3.0); // highpass.z = 2.7 → shake
    assert!(scene.motion().is_shake());

    // Разбуженные улетают по z, соседей не задевают: ровно cap за шаг
    scene.step();
    assert_eq!(scene.awake_count(), MAX_WOKEN_PER_SHAKE);

    scene.step();
    assert_eq!(scene.awake_count(), 2 * MAX_WOKEN_PER_SHAKE);
}

#[test]
fn test_tilt_keeps_tiles_inside_box() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);

    // Будим всех тапами, потом долго держим наклон вниз
    let config = scene.config().clone();
    for column in 0..config.grid_columns {
        for row in 0..config.grid_rows {
            let (x, y) = tap_on_tile(&config, column, row);
            scene.on_touch(x, y);
        }
    }
    assert_eq!(scene.awake_count(), 16);

    for _ in 0..240 {
        scene.on_motion(0.0, -1.0, 0.0);
        scene.step();
    }

    for entity in scene.tiles() {
        let position = scene.tile_pose(entity).expect("pose").translation;
        assert!(position.x.abs() <= config.view_half_width, "{:?}", position);
        assert!(position.y.abs() <= config.view_half_height, "{:?}", position);
        assert!(position.z.abs() <= config.box_half_depth, "{:?}", position);
    }

    // В среднем плитки съехали вниз
    let mean_y: f32 = scene
        .tiles()
        .into_iter()
        .filter_map(|entity| scene.tile_pose(entity))
        .map(|pose| pose.translation.y)
        .sum::<f32>()
        / 16.0;
    assert!(mean_y < 0.0, "mean y = {}", mean_y);
}

#[test]
fn test_render_draws_every_tile_with_its_texture() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let mut backend = RecordingBackend {
        pending_errors: vec![0x502],
        ..Default::default()
    };
    let mut source = CountingSource::default();

    let drawn = scene.render(&mut backend, &mut source).expect("render");
    assert_eq!(drawn, 16);
    assert_eq!(backend.frames, 1);
    assert_eq!(backend.draws.len(), 16);
    // Texture bind на каждую плитку, без batching
    assert_eq!(backend.binds.len(), 16);

    // Bind соответствует texture index плитки
    for (entity, bound) in scene.tiles().into_iter().zip(backend.binds.iter()) {
        let tile = *scene.world().get::<Tile>(entity).expect("tile");
        assert_eq!(scene.textures().get(tile.texture), Some(*bound));
    }

    // Второй кадр не грузит текстуры заново
    scene.render(&mut backend, &mut source).expect("render");
    assert_eq!(source.loads, 16);
    assert_eq!(backend.draws.len(), 32);
}

#[test]
fn test_render_model_matrix_scales_to_half_extents() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let mut backend = RecordingBackend::default();
    let mut source = CountingSource::default();

    scene.render(&mut backend, &mut source).expect("render");

    let head = scene.tiles()[0];
    let center = scene.tile_pose(head).expect("pose").translation;
    let corner = backend.draws[0].transform_point3(Vec3::ONE);
    assert!((corner - (center + Vec3::new(28.5, 28.5, 10.0))).length() < 1e-3);
}

#[test]
fn test_texture_failure_is_reported() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let mut backend = RecordingBackend::default();
    let mut source = CountingSource {
        fail: true,
        ..Default::default()
    };

    let err = scene.render(&mut backend, &mut source).unwrap_err();
    assert!(matches!(err, SceneError::TextureLoad { ref name, .. } if name == "add_ico"));
    assert!(backend.draws.is_empty());
}

#[test]
fn test_teardown_empties_registry_and_releases_textures() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let mut backend = RecordingBackend::default();
    let mut source = CountingSource::default();
    scene.render(&mut backend, &mut source).expect("render");

    let report = scene.teardown(&mut backend);
    assert_eq!(report.tiles_removed, 16);
    assert_eq!(report.textures_released, source.loads);
    assert_eq!(backend.deleted.len(), 16);
    assert!(scene.registry().head().is_none());
    assert_eq!(scene.tile_count(), 0);
    assert_eq!(runtime.live_scenes(), 0);

    // Повторный teardown ничего не делает
    assert_eq!(scene.teardown(&mut backend), TeardownReport::default());
    assert_eq!(backend.deleted.len(), 16);
}

#[test]
fn test_teardown_before_first_render_releases_nothing() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let mut backend = RecordingBackend::default();

    let report = scene.teardown(&mut backend);
    assert_eq!(report.textures_released, 0);
    assert!(backend.deleted.is_empty());
}

#[test]
fn test_scenes_coexist_on_one_runtime() {
    let runtime = runtime();
    let first = Scene::new(&runtime);
    let second = Scene::new(&runtime);
    assert_eq!(runtime.live_scenes(), 2);
    assert_eq!(runtime.holders(), 3);

    drop(first);
    assert_eq!(runtime.live_scenes(), 1);
    assert_eq!(second.tile_count(), 16);

    drop(second);
    assert_eq!(runtime.live_scenes(), 0);
    assert_eq!(runtime.holders(), 1);
}

#[test]
fn test_remove_tile_keeps_registry_connected() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let tiles = scene.tiles();

    assert!(scene.remove_tile(tiles[0]));
    assert!(scene.remove_tile(tiles[7]));
    assert!(!scene.remove_tile(tiles[7]));

    let remaining = scene.tiles();
    assert_eq!(remaining.len(), 14);
    assert_eq!(scene.registry().head(), Some(tiles[1]));
    assert!(!remaining.contains(&tiles[7]));

    // Физика продолжает жить без удалённых тел
    scene.step();
}

#[test]
fn test_advance_runs_whole_fixed_steps() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);
    let dt = scene.config().fixed_dt;

    assert_eq!(scene.advance(dt * 2.5), 2);
    // Остаток 0.5 dt + 0.6 dt = ещё один шаг
    assert_eq!(scene.advance(dt * 0.6), 1);
    assert_eq!(scene.advance(0.0), 0);
    assert_eq!(scene.advance(-1.0), 0);
    assert_eq!(scene.advance(f32::NAN), 0);
}

#[test]
fn test_advance_caps_catch_up_after_suspension() {
    let runtime = runtime();
    let mut scene = Scene::new(&runtime);

    // 10 секунд в фоне → только max_catch_up_steps шагов, остальное выброшено
    assert_eq!(scene.advance(10.0), 4);
    assert_eq!(scene.advance(0.001), 0);
}
