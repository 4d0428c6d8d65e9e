//! Headless прогон сцены
//!
//! Без GPU: backend только считает draw'ы, текстуры — фейковые handle'ы.
//! Сценарий: наклон вниз, один shake, пара тапов, 600 тиков.
//! Необязательный аргумент — путь к JSON с SceneConfig.

use std::process::ExitCode;

use bevy::prelude::*;
use sandbox_simulation::*;

#[derive(Default)]
struct CountingBackend {
    draws: usize,
    textures_deleted: usize,
}

impl GraphicsBackend for CountingBackend {
    fn poll_error(&mut self) -> Option<u32> {
        None
    }

    fn begin_frame(&mut self, _frame: &FrameSetup) {}

    fn bind_texture(&mut self, _texture: TextureHandle) {}

    fn draw_mesh(&mut self, _model: Mat4, _mesh: &CubeMesh) {
        self.draws += 1;
    }

    fn delete_texture(&mut self, _texture: TextureHandle) {
        self.textures_deleted += 1;
    }
}

struct FakeTextures {
    next: u32,
}

impl TextureSource for FakeTextures {
    fn load_texture(&mut self, _name: &str) -> Result<TextureHandle, String> {
        self.next += 1;
        Ok(TextureHandle(self.next))
    }
}

fn load_config() -> Result<SceneConfig, SceneError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|err| SceneError::Config(format!("{}: {}", path, err)))?;
            SceneConfig::from_json(&json)
        }
        None => Ok(SceneConfig::default()),
    }
}

fn run(config: SceneConfig) -> Result<(), SceneError> {
    let runtime = PhysicsRuntime::new(config)?;
    let mut scene = Scene::new(&runtime);
    let mut backend = CountingBackend::default();
    let mut textures = FakeTextures { next: 0 };

    for tick in 0..600 {
        match tick {
            // Резкий толчок вбок → shake
            120 => scene.on_motion(2.5, -1.0, 0.0),
            // Тапы по центру экрана и по левому верхнему углу сетки
            300 => {
                scene.on_touch(160.0, 240.0);
            }
            301 => {
                scene.on_touch(46.5, 61.5);
            }
            _ => scene.on_motion(0.0, -1.0, 0.0),
        }

        scene.step();
        scene.render(&mut backend, &mut textures)?;

        if tick % 100 == 0 {
            println!(
                "Tick {}: {} tiles, {} awake, gravity {:?}",
                tick,
                scene.tile_count(),
                scene.awake_count(),
                scene.gravity().unwrap_or_default()
            );
        }
    }

    let report = scene.teardown(&mut backend);
    println!(
        "Simulation complete! {} draws, {} tiles removed, {} textures released",
        backend.draws, report.tiles_removed, report.textures_released
    );
    Ok(())
}

fn main() -> ExitCode {
    println!("Starting sandbox headless simulation");

    let result = load_config().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            ExitCode::FAILURE
        }
    }
}
