//! Contact presets integration test
//!
//! Полный Rapier стек, но без сетки: одна-две плитки + стенки.
//! Гравитация нулевая (motion не трогаем), движение задаём начальной скоростью.
//! Дефолтный Rapier restitution = 0, поэтому отскок виден только если
//! TileContactHooks реально вызываются на парах.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{Sleeping, Velocity};
use sandbox_simulation::world::{create_headless_app, spawn_boundary, spawn_tile, wake};
use sandbox_simulation::*;

/// Арена со стенками и разбуженными плитками (col, row) с начальными скоростями
fn arena(tiles: &[(u32, u32, Vec3)]) -> (App, Vec<Entity>) {
    let config = SceneConfig::default();
    let mut app = create_headless_app(&config);
    let world = app.world_mut();
    spawn_boundary(world, &config);

    let mut entities = Vec::new();
    for &(column, row, linvel) in tiles {
        let entity = spawn_tile(world, &config, column, row);
        let mut entity_mut = world.entity_mut(entity);
        entity_mut.insert(Velocity::linear(linvel));
        if let Some(mut sleeping) = entity_mut.get_mut::<Sleeping>() {
            wake(&mut sleeping);
        }
        entities.push(entity);
    }

    (app, entities)
}

fn velocity(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Velocity>(entity).expect("velocity").linvel
}

#[test]
fn test_tile_rebounds_from_floor() {
    // Нижний ряд, летит вниз: до пола ~126 px
    let (mut app, tiles) = arena(&[(0, 3, Vec3::new(0.0, -2000.0, 0.0))]);
    let tile = tiles[0];

    let mut hit_floor = false;
    for _ in 0..20 {
        app.update();
        let position = app.world().get::<Transform>(tile).expect("transform").translation;
        if position.y < -200.0 {
            hit_floor = true;
        }
    }

    assert!(hit_floor, "tile never reached the floor");
    // restitution 0.2 от 2000 px/s ≈ 400 px/s вверх
    let rebound = velocity(&app, tile);
    assert!(rebound.y > 100.0, "no rebound from floor: {:?}", rebound);
    // Обратно в пол не провалились
    let position = app.world().get::<Transform>(tile).expect("transform").translation;
    assert!(position.y > -240.0, "{:?}", position);
}

#[test]
fn test_tiles_bounce_off_each_other() {
    // Соседи в верхнем ряду, зазор 19 px; левая летит в правую
    let (mut app, tiles) = arena(&[
        (0, 0, Vec3::new(1000.0, 0.0, 0.0)),
        (1, 0, Vec3::ZERO),
    ]);

    for _ in 0..6 {
        app.update();
    }

    let left = velocity(&app, tiles[0]);
    let right = velocity(&app, tiles[1]);
    // Равные массы, restitution 0.4: ~300 и ~700; без отскока обе ~500
    assert!(right.x > 0.0, "right tile was not hit: {:?}", right);
    assert!(
        right.x - left.x > 150.0,
        "tiles stuck together: left {:?}, right {:?}",
        left,
        right
    );
}
