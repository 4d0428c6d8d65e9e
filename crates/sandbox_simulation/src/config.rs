//! SceneConfig — геометрия арены, раскладка сетки, параметры шага
//!
//! Единицы — пиксели (320×480 view при 160dpi). Default = раскладка 4×4 иконок на экране 320×480.
//! Коэффициенты фильтра motion/gravity сюда НЕ входят (см. `motion`), это фиксированный tuning.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::render::ICON_TEXTURE_NAMES;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Половина ширины view (ортопроекция и боковые стенки)
    pub view_half_width: f32,
    /// Половина высоты view (верх/низ)
    pub view_half_height: f32,
    /// Половина глубины коробки (front/back плоскости)
    pub box_half_depth: f32,

    pub grid_columns: u32,
    pub grid_rows: u32,
    /// Шаг сетки по x / y (пиксели)
    pub column_spacing: f32,
    pub row_spacing: f32,
    /// Отступ центра первой плитки от левого верхнего угла
    pub grid_inset: [f32; 2],

    /// Полные размеры плитки (x, y, z)
    pub tile_size: [f32; 3],
    /// Полная масса плитки
    pub tile_mass: f32,

    /// Фиксированный шаг симуляции (секунды)
    pub fixed_dt: f32,
    /// Максимум шагов за один `advance` (догон после пропущенных кадров)
    pub max_catch_up_steps: u32,

    /// Масштаб длины для Rapier (tolerances считаются в этих единицах)
    pub length_unit: f32,

    /// Seed для touch RNG
    pub rng_seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            view_half_width: 160.0,
            view_half_height: 240.0,
            box_half_depth: 50.0,
            grid_columns: 4,
            grid_rows: 4,
            column_spacing: 76.0,
            row_spacing: 88.0,
            grid_inset: [46.5, 61.5],
            tile_size: [57.0, 57.0, 20.0],
            tile_mass: 0.1,
            fixed_dt: 1.0 / 60.0,
            max_catch_up_steps: 4,
            length_unit: 60.0,
            rng_seed: 0x5eed_1c0,
        }
    }
}

impl SceneConfig {
    /// Парсит JSON (отсутствующие поля = default) и валидирует
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SceneError> {
        let positive = [
            ("view_half_width", self.view_half_width),
            ("view_half_height", self.view_half_height),
            ("box_half_depth", self.box_half_depth),
            ("tile_mass", self.tile_mass),
            ("fixed_dt", self.fixed_dt),
            ("length_unit", self.length_unit),
            ("tile_size.x", self.tile_size[0]),
            ("tile_size.y", self.tile_size[1]),
            ("tile_size.z", self.tile_size[2]),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SceneError::Config(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        let tile_count = self.grid_columns as usize * self.grid_rows as usize;
        if tile_count == 0 {
            return Err(SceneError::Config("grid must contain at least one tile".into()));
        }
        // Одна текстура на плитку, индекс = col + row * columns
        if tile_count > ICON_TEXTURE_NAMES.len() {
            return Err(SceneError::Config(format!(
                "grid of {} tiles exceeds {} icon textures",
                tile_count,
                ICON_TEXTURE_NAMES.len()
            )));
        }

        if self.max_catch_up_steps == 0 {
            return Err(SceneError::Config(
                "max_catch_up_steps must be at least 1".into(),
            ));
        }

        // Сетка целиком внутри стенок: крайние плитки (0, 0) и (cols-1, rows-1)
        let half = self.tile_half_extents();
        let corners = [
            self.tile_position(0, 0),
            self.tile_position(self.grid_columns - 1, self.grid_rows - 1),
        ];
        for corner in corners {
            if corner.x.abs() + half.x > self.view_half_width
                || corner.y.abs() + half.y > self.view_half_height
            {
                return Err(SceneError::Config(format!(
                    "tile at ({}, {}) does not fit into the {}x{} view",
                    corner.x,
                    corner.y,
                    self.view_half_width * 2.0,
                    self.view_half_height * 2.0
                )));
            }
        }

        if self.tile_size[2] * 0.5 >= self.box_half_depth {
            return Err(SceneError::Config(format!(
                "tile depth {} does not fit into box depth {}",
                self.tile_size[2],
                self.box_half_depth * 2.0
            )));
        }

        Ok(())
    }

    pub fn tile_count(&self) -> usize {
        self.grid_columns as usize * self.grid_rows as usize
    }

    pub fn tile_half_extents(&self) -> Vec3 {
        Vec3::from_array(self.tile_size) * 0.5
    }

    /// Центр плитки (col, row): row 0 — верхний ряд, y вверх
    pub fn tile_position(&self, column: u32, row: u32) -> Vec3 {
        let x = -self.view_half_width + column as f32 * self.column_spacing + self.grid_inset[0];
        let y = self.view_half_height - row as f32 * self.row_spacing - self.grid_inset[1];
        Vec3::new(x, y, 0.0)
    }

    pub fn texture_index(&self, column: u32, row: u32) -> usize {
        (column + row * self.grid_columns) as usize
    }

    /// Tap (origin top-left, y вниз) → точка на плоскости z = 0 в координатах мира
    pub fn view_to_world(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x - self.view_half_width, self.view_half_height - y)
    }
}
