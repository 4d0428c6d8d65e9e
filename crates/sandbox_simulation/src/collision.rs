//! Collision policy: как реагировать на контакт (не «есть ли контакт»)
//!
//! Broad/narrow phase — целиком Rapier. Здесь только per-pair решение:
//! - static-static → без контактов
//! - tile-vs-tile → скользко и прыгуче
//! - tile-vs-world → липко, слабый отскок
//! - медленное сближение (ниже bounce_velocity) → без отскока
//! Пресет применяется ко ВСЕМ точкам пары, точек не больше MAX_CONTACTS.
//! Solver contacts живут один шаг — Rapier пересобирает их каждый step.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use bevy_rapier3d::rapier::prelude::{Point, Real, RigidBodyHandle, Vector};

use crate::components::Tile;

/// Максимум точек контакта на пару
pub const MAX_CONTACTS: usize = 4;

/// Тип пары по наличию тел
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// Оба коллайдера на динамических телах
    ObjectObject,
    /// Одна сторона — статика (стенка арены)
    ObjectWorld,
}

impl PairKind {
    /// None = static-static, пара игнорируется
    pub fn classify(has_body1: bool, has_body2: bool) -> Option<Self> {
        match (has_body1, has_body2) {
            (false, false) => None,
            (true, true) => Some(PairKind::ObjectObject),
            _ => Some(PairKind::ObjectWorld),
        }
    }
}

/// Параметры поверхности для всех точек контакта пары
///
/// Softness (CFM) в пресетах нет: Rapier задаёт мягкость контактов только
/// глобально через IntegrationParameters, не per-contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSurface {
    pub friction: f32,
    pub restitution: f32,
    /// Ниже этой скорости сближения (px/s по нормали) отскока нет
    pub bounce_velocity: f32,
}

pub const OBJECT_OBJECT_SURFACE: ContactSurface = ContactSurface {
    friction: 0.0,
    restitution: 0.4,
    bounce_velocity: 0.1,
};

pub const OBJECT_WORLD_SURFACE: ContactSurface = ContactSurface {
    friction: 100.0,
    restitution: 0.2,
    bounce_velocity: 0.1,
};

impl ContactSurface {
    /// Restitution для точки с данной скоростью сближения
    pub fn restitution_at(&self, approach_speed: f32) -> f32 {
        if approach_speed > self.bounce_velocity {
            self.restitution
        } else {
            0.0
        }
    }
}

pub fn surface_for(kind: PairKind) -> ContactSurface {
    match kind {
        PairKind::ObjectObject => OBJECT_OBJECT_SURFACE,
        PairKind::ObjectWorld => OBJECT_WORLD_SURFACE,
    }
}

/// Полное решение для пары: None = контактов не будет
pub fn select_surface(has_body1: bool, has_body2: bool) -> Option<ContactSurface> {
    PairKind::classify(has_body1, has_body2).map(surface_for)
}

/// Сколько точек контакта пара получит после cap'а
pub fn capped_contact_count(computed: usize) -> usize {
    computed.min(MAX_CONTACTS)
}

/// Режет точки до MAX_CONTACTS и применяет пресет к каждой оставшейся
pub fn cap_and_shape<C>(contacts: &mut Vec<C>, mut shape: impl FnMut(&mut C)) {
    contacts.truncate(capped_contact_count(contacts.len()));
    for contact in contacts.iter_mut() {
        shape(contact);
    }
}

/// Hooks-объект для Rapier: вызывается на каждую пару из narrow phase
///
/// Плитки несут `ActiveHooks::FILTER_CONTACT_PAIRS | MODIFY_SOLVER_CONTACTS`,
/// стенки — нет (Rapier зовёт hooks если хотя бы у одного коллайдера они включены).
#[derive(SystemParam)]
pub struct TileContactHooks<'w, 's> {
    tiles: Query<'w, 's, (), With<Tile>>,
}

impl TileContactHooks<'_, '_> {
    fn has_body(&self, collider: Entity) -> bool {
        // Коллайдер плитки = её rigid body (один entity). Всё остальное — статика.
        self.tiles.contains(collider)
    }
}

impl BevyPhysicsHooks for TileContactHooks<'_, '_> {
    fn filter_contact_pair(&self, context: PairFilterContextView) -> Option<SolverFlags> {
        let has_body1 = self.has_body(context.collider1());
        let has_body2 = self.has_body(context.collider2());

        select_surface(has_body1, has_body2).map(|_| SolverFlags::COMPUTE_IMPULSES)
    }

    fn modify_solver_contacts(&self, mut context: ContactModificationContextView) {
        let has_body1 = self.has_body(context.collider1());
        let has_body2 = self.has_body(context.collider2());

        let Some(surface) = select_surface(has_body1, has_body2) else {
            context.raw.solver_contacts.clear();
            return;
        };

        // Нормаль направлена от collider1 к collider2
        let raw = &mut *context.raw;
        let normal = *raw.normal;
        let bodies = raw.bodies;
        let (body1, body2) = (raw.rigid_body1, raw.rigid_body2);
        let velocity_at = |handle: Option<RigidBodyHandle>, point: &Point<Real>| {
            handle
                .and_then(|handle| bodies.get(handle))
                .map(|body| body.velocity_at_point(point))
                .unwrap_or_else(Vector::zeros)
        };

        cap_and_shape(&mut *raw.solver_contacts, |contact| {
            let relative = velocity_at(body1, &contact.point) - velocity_at(body2, &contact.point);
            contact.friction = surface.friction;
            contact.restitution = surface.restitution_at(relative.dot(&normal));
        });
    }
}
