//! ECS компоненты сцены: Tile, Boundary

use bevy::prelude::*;

/// Плитка-иконка (динамическое тело + box collider на одном entity)
///
/// Инвариант: body и collider живут и умирают вместе — это один entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Tile {
    /// Индекс текстуры в TextureSet (col + row * columns)
    pub texture: usize,
    pub column: u32,
    pub row: u32,
}

/// Стенка арены (статический half-space, без rigid body)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Boundary {
    pub side: BoundarySide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum BoundarySide {
    Left,
    Right,
    Bottom,
    Top,
    Back,
    Front,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 6] = [
        BoundarySide::Left,
        BoundarySide::Right,
        BoundarySide::Bottom,
        BoundarySide::Top,
        BoundarySide::Back,
        BoundarySide::Front,
    ];

    /// Нормаль, смотрящая внутрь коробки
    pub fn inward_normal(&self) -> Vec3 {
        match self {
            BoundarySide::Left => Vec3::X,
            BoundarySide::Right => Vec3::NEG_X,
            BoundarySide::Bottom => Vec3::Y,
            BoundarySide::Top => Vec3::NEG_Y,
            BoundarySide::Back => Vec3::Z,
            BoundarySide::Front => Vec3::NEG_Z,
        }
    }
}
