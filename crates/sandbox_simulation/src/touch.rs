//! Touch interaction: tap → ray сквозь сцену → wake + случайный пинок
//!
//! Ray создаётся и умирает внутри вызова: перпендикулярно плоскости view,
//! от z = -1000 вдоль +z, длина 2000. Задеваем только плитки (стенки игнорируем).

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{ExternalImpulse, ReadRapierContext, Sleeping};
use rand::Rng;

use crate::components::Tile;
use crate::config::SceneConfig;
use crate::world::{wake, TouchRng};

pub const RAY_START_Z: f32 = -1000.0;
pub const RAY_LENGTH: f32 = 2000.0;

/// Вертикальная сила пинка (всегда вверх)
pub const KICK_UP_FORCE: f32 = 2000.0;
/// Горизонтальная сила: U(-spread, +spread) по x и z
pub const KICK_SIDE_SPREAD: f32 = 500.0;
/// Torque: U(-spread, +spread) по каждой оси; x шире, чем y/z
pub const KICK_TORQUE_SPREAD: Vec3 = Vec3::new(25000.0, 5000.0, 5000.0);

/// Сила + torque одного пинка (действуют один шаг)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchKick {
    pub force: Vec3,
    pub torque: Vec3,
}

impl TouchKick {
    pub fn random(rng: &mut impl Rng) -> Self {
        let force = Vec3::new(
            rng.gen_range(-KICK_SIDE_SPREAD..=KICK_SIDE_SPREAD),
            KICK_UP_FORCE,
            rng.gen_range(-KICK_SIDE_SPREAD..=KICK_SIDE_SPREAD),
        );
        let torque = Vec3::new(
            rng.gen_range(-KICK_TORQUE_SPREAD.x..=KICK_TORQUE_SPREAD.x),
            rng.gen_range(-KICK_TORQUE_SPREAD.y..=KICK_TORQUE_SPREAD.y),
            rng.gen_range(-KICK_TORQUE_SPREAD.z..=KICK_TORQUE_SPREAD.z),
        );
        Self { force, torque }
    }

    /// Сила на один шаг dt → импульс (Rapier сбрасывает ExternalImpulse после шага)
    pub fn apply(&self, impulse: &mut ExternalImpulse, dt: f32) {
        impulse.impulse += self.force * dt;
        impulse.torque_impulse += self.torque * dt;
    }
}

/// Ray для тапа (origin top-left, y вниз) в координатах мира
pub fn touch_ray(config: &SceneConfig, x: f32, y: f32) -> (Vec3, Vec3) {
    let point = config.view_to_world(x, y);
    (Vec3::new(point.x, point.y, RAY_START_Z), Vec3::Z)
}

/// Все плитки, чей collider пересекает ray
pub fn tiles_under_ray(world: &mut World, origin: Vec3, direction: Vec3) -> Vec<Entity> {
    let mut state: SystemState<(ReadRapierContext, Query<(), With<Tile>>)> = SystemState::new(world);
    let (rapier, tiles) = state.get(world);

    let Ok(context) = rapier.single() else {
        crate::logger::log_warning("Touch: no Rapier context, ray skipped");
        return Vec::new();
    };

    let mut hits = Vec::new();
    context.intersect_ray(
        origin,
        direction,
        RAY_LENGTH,
        true,
        bevy_rapier3d::prelude::QueryFilter::only_dynamic(),
        |entity, _intersection| {
            if tiles.contains(entity) {
                hits.push(entity);
            }
            true // продолжаем — нужны все пересечения
        },
    );

    hits
}

/// Тап: будит и пинает каждую задетую плитку, возвращает список задетых
pub fn handle_touch(world: &mut World, x: f32, y: f32) -> Vec<Entity> {
    let config = world.resource::<SceneConfig>().clone();
    let (origin, direction) = touch_ray(&config, x, y);
    let hits = tiles_under_ray(world, origin, direction);

    for entity in &hits {
        let kick = TouchKick::random(&mut world.resource_mut::<TouchRng>().rng);

        if let Some(mut sleeping) = world.get_mut::<Sleeping>(*entity) {
            wake(&mut sleeping);
        }
        if let Some(mut impulse) = world.get_mut::<ExternalImpulse>(*entity) {
            kick.apply(&mut impulse, config.fixed_dt);
        }
    }

    if !hits.is_empty() {
        crate::logger::log(&format!("Touch at ({:.1}, {:.1}): kicked {} tile(s)", x, y, hits.len()));
    }

    hits
}
