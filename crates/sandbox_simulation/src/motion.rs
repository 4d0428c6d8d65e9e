//! Input shaping: motion sensor → synthetic gravity
//!
//! Каждый sample раскладывается на low-pass (устойчивый наклон) и
//! high-pass (резкий толчок). Наклон даёт мягкую гравитацию, толчок — усиленный kick.
//! Shake (|highpass|² > 1) будит ограниченное число спящих плиток.

use bevy::prelude::*;

/// Коэффициент экспоненциального сглаживания
pub const LOWPASS_FACTOR: f32 = 0.1;
/// Вклад low-pass в гравитацию
pub const LOWPASS_GAIN: f32 = 1.0;
/// Вклад high-pass в гравитацию (shake kick)
pub const HIGHPASS_GAIN: f32 = 10.0;
/// Пикселей на метр при 160dpi
pub const PIXELS_PER_METER: f32 = 6300.0;
/// Порог |highpass|² для shake
pub const SHAKE_THRESHOLD_SQ: f32 = 1.0;
/// Сколько спящих плиток будит один shake
pub const MAX_WOKEN_PER_SHAKE: usize = 3;

/// Состояние motion фильтра (три канала x/y/z)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionFilter {
    pub raw: Vec3,
    pub lowpass: Vec3,
    pub highpass: Vec3,
}

impl MotionFilter {
    pub fn sample(&mut self, raw: Vec3) {
        self.lowpass += (raw - self.lowpass) * LOWPASS_FACTOR;
        self.highpass = raw - self.lowpass;
        self.raw = raw;
    }

    pub fn gravity(&self) -> Vec3 {
        gravity_from(self.lowpass, self.highpass)
    }

    pub fn is_shake(&self) -> bool {
        self.highpass.length_squared() > SHAKE_THRESHOLD_SQ
    }
}

pub fn gravity_from(lowpass: Vec3, highpass: Vec3) -> Vec3 {
    (lowpass * LOWPASS_GAIN + highpass * HIGHPASS_GAIN) * PIXELS_PER_METER
}

/// Выбирает до `limit` спящих тел в порядке итерации (registry order)
///
/// Вход: (entity, sleeping). Уже проснувшиеся тела не считаются.
pub fn pick_sleepers(
    bodies: impl IntoIterator<Item = (Entity, bool)>,
    limit: usize,
) -> Vec<Entity> {
    bodies
        .into_iter()
        .filter(|(_, sleeping)| *sleeping)
        .map(|(entity, _)| entity)
        .take(limit)
        .collect()
}
