//! Physics world adapter
//!
//! Один headless Bevy App = один Rapier world + collision space + стенки арены.
//! Шаг строго фиксированный (TimestepMode::Fixed): один `app.update()` = один тик 1/60.
//!
//! Порядок внутри тика (PostUpdate, до PhysicsSet::SyncBackend):
//! 1. apply_motion_gravity — гравитация из motion фильтра
//! 2. wake_on_shake — shake будит до 3 спящих плиток
//! 3. Rapier: collision (через TileContactHooks) → integrate → writeback Transform

use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_rapier3d::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::collision::TileContactHooks;
use crate::components::{Boundary, BoundarySide, Tile};
use crate::config::SceneConfig;
use crate::motion::{pick_sleepers, MotionFilter, MAX_WOKEN_PER_SHAKE};
use crate::registry::TileRegistry;

/// RNG для touch impulses (seeded из SceneConfig)
#[derive(Resource)]
pub struct TouchRng {
    pub rng: ChaCha8Rng,
}

impl TouchRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

/// Главный plugin сцены: ресурсы + per-tick системы поверх Rapier
pub struct ScenePhysicsPlugin {
    pub config: SceneConfig,
}

impl Plugin for ScenePhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(
            RapierPhysicsPlugin::<TileContactHooks>::default()
                .with_length_unit(self.config.length_unit),
        )
        // Ровно один шаг dt на update, без привязки к wall-clock
        .insert_resource(TimestepMode::Fixed {
            dt: self.config.fixed_dt,
            substeps: 1,
        })
        .insert_resource(self.config.clone())
        .insert_resource(TouchRng::new(self.config.rng_seed))
        .init_resource::<MotionFilter>()
        .init_resource::<TileRegistry>();

        app.add_systems(
            PostUpdate,
            (apply_motion_gravity, wake_on_shake)
                .chain()
                .before(PhysicsSet::SyncBackend),
        );
    }
}

/// Создаёт headless App с Rapier и ресурсами сцены (стенки и плитки спавнит `Scene::new`)
pub fn create_headless_app(config: &SceneConfig) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, TransformPlugin))
        .add_plugins(ScenePhysicsPlugin {
            config: config.clone(),
        });
    app
}

/// Система: гравитация всех Rapier контекстов = f(motion)
pub fn apply_motion_gravity(
    motion: Res<MotionFilter>,
    mut configurations: Query<&mut RapierConfiguration>,
) {
    let gravity = motion.gravity();
    for mut configuration in configurations.iter_mut() {
        if configuration.gravity != gravity {
            configuration.gravity = gravity;
        }
    }
}

/// Система: shake → будим до MAX_WOKEN_PER_SHAKE спящих плиток в registry order
pub fn wake_on_shake(
    motion: Res<MotionFilter>,
    registry: Res<TileRegistry>,
    mut bodies: Query<&mut Sleeping, With<Tile>>,
) {
    if !motion.is_shake() {
        return;
    }

    let candidates = registry.iter().filter_map(|entity| {
        bodies
            .get(entity)
            .ok()
            .map(|sleeping| (entity, sleeping.sleeping))
    });
    let woken = pick_sleepers(candidates, MAX_WOKEN_PER_SHAKE);

    for entity in &woken {
        if let Ok(mut sleeping) = bodies.get_mut(*entity) {
            wake(&mut sleeping);
        }
    }

    if !woken.is_empty() {
        crate::logger::log(&format!(
            "Shake (|highpass|² = {:.2}): woke {} tile(s)",
            motion.highpass.length_squared(),
            woken.len()
        ));
    }
}

/// Будит тело и запрещает ему засыпать снова (auto-sleep у плиток выключен)
pub fn wake(sleeping: &mut Sleeping) {
    *sleeping = Sleeping::disabled();
}

/// Спавнит 6 стенок арены: half-space'ы с нормалями внутрь коробки
pub fn spawn_boundary(world: &mut World, config: &SceneConfig) -> Vec<Entity> {
    let mut walls = Vec::with_capacity(BoundarySide::ALL.len());

    for side in BoundarySide::ALL {
        let normal = side.inward_normal();
        // Точка на плоскости: -normal * расстояние до центра
        let distance = match side {
            BoundarySide::Left | BoundarySide::Right => config.view_half_width,
            BoundarySide::Bottom | BoundarySide::Top => config.view_half_height,
            BoundarySide::Back | BoundarySide::Front => config.box_half_depth,
        };

        let Some(collider) = Collider::halfspace(normal) else {
            crate::logger::log_error(&format!("Boundary {:?}: degenerate normal {:?}", side, normal));
            continue;
        };

        let wall = world
            .spawn((
                Boundary { side },
                Transform::from_translation(-normal * distance),
                collider,
            ))
            .id();
        walls.push(wall);
    }

    walls
}

/// Спавнит одну плитку (спящей) и вставляет её в голову registry
pub fn spawn_tile(world: &mut World, config: &SceneConfig, column: u32, row: u32) -> Entity {
    let half = config.tile_half_extents();
    let tile = Tile {
        texture: config.texture_index(column, row),
        column,
        row,
    };

    let entity = world
        .spawn((
            tile,
            Transform::from_translation(config.tile_position(column, row)),
            RigidBody::Dynamic,
            Collider::cuboid(half.x, half.y, half.z),
            ColliderMassProperties::Mass(config.tile_mass),
            // Стартуем disabled: спим, пока не разбудит shake или touch
            Sleeping {
                sleeping: true,
                ..Sleeping::disabled()
            },
            ExternalImpulse::default(),
            ActiveHooks::FILTER_CONTACT_PAIRS | ActiveHooks::MODIFY_SOLVER_CONTACTS,
        ))
        .id();

    world.resource_mut::<TileRegistry>().push_front(entity);
    entity
}

/// Сетка columns × rows, column-major: последняя вставленная плитка (col-1, row-1) в голове registry
pub fn spawn_grid(world: &mut World, config: &SceneConfig) -> Vec<Entity> {
    let mut tiles = Vec::with_capacity(config.tile_count());
    for column in 0..config.grid_columns {
        for row in 0..config.grid_rows {
            tiles.push(spawn_tile(world, config, column, row));
        }
    }
    tiles
}

/// Вырезает плитку из registry и деспавнит entity (body + collider разом)
pub fn despawn_tile(world: &mut World, entity: Entity) -> bool {
    let removed = world.resource_mut::<TileRegistry>().remove(entity);
    if removed {
        world.despawn(entity);
    }
    removed
}
