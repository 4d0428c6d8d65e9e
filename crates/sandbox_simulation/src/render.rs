//! Renderer: fixed-function отрисовка плиток через host backend
//!
//! GPU сюда не входит — host реализует `GraphicsBackend` (GLES1, wgpu, mock в тестах).
//! Per-tile: model matrix из позы тела, scale на half-extents коллайдера,
//! bind текстуры плитки, draw unit cube. Без batching и сортировки (только depth test).

use bevy::prelude::*;
use bevy_rapier3d::prelude::Collider;

use crate::components::Tile;
use crate::config::SceneConfig;
use crate::error::SceneError;
use crate::registry::TileRegistry;

/// Имена иконок в порядке texture index
pub const ICON_TEXTURE_NAMES: [&str; 16] = [
    "add_ico", "app_ico", "cal_ico", "clc_ico", "clo_ico", "ear_ico", "itu_ico", "map_ico",
    "mov_ico", "not_ico", "pho_ico", "saf_ico", "set_ico", "sto_ico", "wea_ico", "you_ico",
];

/// Handle текстуры, выданный host'ом (GL texture name и т.п.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Unit cube: 8 вершин, 36 индексов (12 треугольников)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeMesh {
    pub positions: [[f32; 3]; 8],
    pub uvs: [[f32; 2]; 8],
    pub indices: [u8; 36],
}

/// Края иконки внутри атласа 64×64 (1px отступ)
const UV_LO: f32 = 1.0 / 64.0;
const UV_HI: f32 = 58.0 / 64.0;

pub const UNIT_CUBE: CubeMesh = CubeMesh {
    positions: [
        [-1.0, -1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
    ],
    uvs: [
        [UV_LO, UV_HI],
        [UV_LO, UV_HI],
        [UV_LO, UV_LO],
        [UV_LO, UV_LO],
        [UV_HI, UV_HI],
        [UV_HI, UV_HI],
        [UV_HI, UV_LO],
        [UV_HI, UV_LO],
    ],
    indices: [
        0, 1, 3, 0, 3, 2, // -x
        4, 6, 7, 4, 7, 5, // +x
        0, 4, 5, 0, 5, 1, // -y
        3, 7, 6, 3, 6, 2, // +y
        0, 2, 6, 0, 6, 4, // -z
        1, 5, 7, 7, 3, 1, // +z
    ],
};

impl CubeMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Depth compare для кадра
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTest {
    LessOrEqual,
}

/// Состояние кадра: проекция, clear, depth test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSetup {
    pub projection: Mat4,
    pub clear_color: [f32; 4],
    pub depth_test: DepthTest,
}

impl FrameSetup {
    pub fn for_config(config: &SceneConfig) -> Self {
        Self {
            projection: Mat4::orthographic_rh_gl(
                -config.view_half_width,
                config.view_half_width,
                -config.view_half_height,
                config.view_half_height,
                -2.0 * config.box_half_depth,
                2.0 * config.box_half_depth,
            ),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: DepthTest::LessOrEqual,
        }
    }
}

/// Fixed-function графика host'а
pub trait GraphicsBackend {
    /// Код последней ошибки GPU API (аналог glGetError), None если чисто
    fn poll_error(&mut self) -> Option<u32>;
    fn begin_frame(&mut self, frame: &FrameSetup);
    fn bind_texture(&mut self, texture: TextureHandle);
    fn draw_mesh(&mut self, model: Mat4, mesh: &CubeMesh);
    fn delete_texture(&mut self, texture: TextureHandle);
}

/// Декодер изображений host'а: имя → готовый к bind handle
pub trait TextureSource {
    fn load_texture(&mut self, name: &str) -> Result<TextureHandle, String>;
}

/// 16 handle'ов иконок, грузятся лениво при первом render
#[derive(Debug, Default)]
pub struct TextureSet {
    handles: Vec<TextureHandle>,
}

impl TextureSet {
    pub fn is_loaded(&self) -> bool {
        !self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TextureHandle> {
        self.handles.get(index).copied()
    }

    /// Грузит все иконки разом; любая ошибка фатальна (частичный набор не сохраняется)
    pub fn ensure_loaded(&mut self, source: &mut impl TextureSource) -> Result<(), SceneError> {
        if self.is_loaded() {
            return Ok(());
        }

        let mut handles = Vec::with_capacity(ICON_TEXTURE_NAMES.len());
        for name in ICON_TEXTURE_NAMES {
            let handle = source
                .load_texture(name)
                .map_err(|reason| SceneError::TextureLoad {
                    name: name.to_string(),
                    reason,
                })?;
            handles.push(handle);
        }

        crate::logger::log(&format!("Loaded {} icon textures", handles.len()));
        self.handles = handles;
        Ok(())
    }

    /// Удаляет все handle'ы через backend, возвращает сколько удалено
    pub fn release(&mut self, backend: &mut impl GraphicsBackend) -> usize {
        let released = self.handles.len();
        for handle in self.handles.drain(..) {
            backend.delete_texture(handle);
        }
        released
    }
}

/// Rotation (3×3) + translation из позы тела, потом scale на half-extents
pub fn tile_model_matrix(transform: &Transform, half_extents: Vec3) -> Mat4 {
    Mat4::from_rotation_translation(transform.rotation, transform.translation)
        * Mat4::from_scale(half_extents)
}

/// Рисует все плитки в registry order, возвращает сколько нарисовано
pub fn render_tiles(
    world: &World,
    textures: &mut TextureSet,
    backend: &mut impl GraphicsBackend,
    source: &mut impl TextureSource,
) -> Result<usize, SceneError> {
    textures.ensure_loaded(source)?;

    let config = world.resource::<SceneConfig>();
    let registry = world.resource::<TileRegistry>();

    backend.begin_frame(&FrameSetup::for_config(config));

    let mut drawn = 0;
    for entity in registry.iter() {
        // Ошибки GPU только логируем, рендер не прерываем
        if let Some(code) = backend.poll_error() {
            crate::logger::log_error(&format!("GLERR {:x}", code));
        }

        let Ok(tile) = world.get_entity(entity) else {
            continue;
        };
        let (Some(info), Some(transform)) = (tile.get::<Tile>(), tile.get::<Transform>()) else {
            continue;
        };

        let half_extents = tile
            .get::<Collider>()
            .and_then(|collider| collider.as_cuboid().map(|cuboid| cuboid.half_extents()))
            .unwrap_or_else(|| config.tile_half_extents());

        let Some(texture) = textures.get(info.texture) else {
            crate::logger::log_warning(&format!(
                "Tile {:?}: texture index {} out of range",
                entity, info.texture
            ));
            continue;
        };

        backend.bind_texture(texture);
        backend.draw_mesh(tile_model_matrix(transform, half_extents), &UNIT_CUBE);
        drawn += 1;
    }

    Ok(drawn)
}
