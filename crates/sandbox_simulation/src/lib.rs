//! Sandbox Simulation Core
//!
//! Сетка 4×4 плиток-иконок в закрытой коробке: физика — Rapier (bevy_rapier3d),
//! вход — accelerometer + тапы, рендер — fixed-function backend host'а.
//!
//! Слой оркестрации, не движок:
//! - world: Rapier world + стенки + фиксированный шаг
//! - registry: живые плитки (стабильные handle'ы, O(1) вставка/удаление)
//! - collision: per-pair пресеты поверхности (TileContactHooks)
//! - motion: low/high-pass → гравитация, shake wake
//! - touch: ray → wake + пинок
//! - render: unit cube на плитку через GraphicsBackend
//! - scene: внешний интерфейс для platform shell

pub mod collision;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod motion;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod touch;
pub mod world;


// Re-export основных типов
pub use components::{Boundary, BoundarySide, Tile};
pub use config::SceneConfig;
pub use error::SceneError;
pub use motion::MotionFilter;
pub use registry::TileRegistry;
pub use render::{
    CubeMesh, FrameSetup, GraphicsBackend, TextureHandle, TextureSet, TextureSource,
    ICON_TEXTURE_NAMES, UNIT_CUBE,
};
pub use runtime::PhysicsRuntime;
pub use scene::{Scene, TeardownReport};
pub use world::{create_headless_app, ScenePhysicsPlugin};
