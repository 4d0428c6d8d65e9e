//! TileRegistry — упорядоченный набор живых плиток сцены
//!
//! Arena стабильных handle'ов (`Entity`) + prev/next ссылки по handle.
//! Вставка в голову O(1), удаление O(1) с патчем head. Порядок никому не важен,
//! кроме shake-wake (сканирует по порядку) и рендера.

use bevy::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Links {
    prev: Option<Entity>,
    next: Option<Entity>,
}

#[derive(Resource, Debug, Default, Clone)]
pub struct TileRegistry {
    links: HashMap<Entity, Links>,
    head: Option<Entity>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn head(&self) -> Option<Entity> {
        self.head
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.links.contains_key(&entity)
    }

    pub fn next(&self, entity: Entity) -> Option<Entity> {
        self.links.get(&entity).and_then(|links| links.next)
    }

    pub fn prev(&self, entity: Entity) -> Option<Entity> {
        self.links.get(&entity).and_then(|links| links.prev)
    }

    /// Вставка в голову. Повторная вставка того же handle — no-op (false).
    pub fn push_front(&mut self, entity: Entity) -> bool {
        if self.links.contains_key(&entity) {
            return false;
        }

        let old_head = self.head;
        if let Some(old) = old_head {
            if let Some(links) = self.links.get_mut(&old) {
                links.prev = Some(entity);
            }
        }

        self.links.insert(
            entity,
            Links {
                prev: None,
                next: old_head,
            },
        );
        self.head = Some(entity);
        true
    }

    /// Вырезает handle из списка. Неизвестный handle — no-op (false).
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some(links) = self.links.remove(&entity) else {
            return false;
        };

        if let Some(prev) = links.prev {
            if let Some(prev_links) = self.links.get_mut(&prev) {
                prev_links.next = links.next;
            }
        }
        if let Some(next) = links.next {
            if let Some(next_links) = self.links.get_mut(&next) {
                next_links.prev = links.prev;
            }
        }

        if self.head == Some(entity) {
            self.head = links.next;
        }
        true
    }

    pub fn pop_front(&mut self) -> Option<Entity> {
        let head = self.head?;
        self.remove(head);
        Some(head)
    }

    /// Опустошает registry спереди назад, возвращая handle'ы в порядке удаления
    pub fn drain(&mut self) -> Vec<Entity> {
        let mut drained = Vec::with_capacity(self.len());
        while let Some(entity) = self.pop_front() {
            drained.push(entity);
        }
        drained
    }

    pub fn iter(&self) -> TileIter<'_> {
        TileIter {
            registry: self,
            cursor: self.head,
        }
    }
}

/// Обход от head по next-ссылкам
pub struct TileIter<'a> {
    registry: &'a TileRegistry,
    cursor: Option<Entity>,
}

impl Iterator for TileIter<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.cursor?;
        self.cursor = self.registry.next(current);
        Some(current)
    }
}

impl<'a> IntoIterator for &'a TileRegistry {
    type Item = Entity;
    type IntoIter = TileIter<'a>;

    fn into_iter(self) -> TileIter<'a> {
        self.iter()
    }
}
