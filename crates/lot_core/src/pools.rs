//! Finite-capacity resource pools (parking spaces, chargers).
//!
//! Each pool lives on its own entity; vehicles hold the entity ids through
//! [crate::ecs::PoolHandles]. Waiters are served strictly first come, first served.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Component, Entity, World};

use crate::ecs::PoolHandles;

#[derive(Debug, Clone, Component)]
pub struct ResourcePool {
    pub label: String,
    capacity: usize,
    in_use: usize,
    waiting: VecDeque<Entity>,
}

impl ResourcePool {
    pub fn new(label: impl Into<String>, capacity: usize) -> Self {
        Self {
            label: label.into(),
            capacity,
            in_use: 0,
            waiting: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn available(&self) -> usize {
        self.capacity - self.in_use
    }

    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    /// Take a slot if one is free and nobody is queued ahead.
    pub fn try_acquire(&mut self) -> bool {
        if self.in_use < self.capacity && self.waiting.is_empty() {
            self.in_use += 1;
            true
        } else {
            false
        }
    }

    pub fn enqueue(&mut self, vehicle: Entity) {
        self.waiting.push_back(vehicle);
    }

    /// Give a slot back. If someone is waiting the slot passes straight to
    /// them and their entity is returned; `in_use` stays unchanged.
    pub fn release(&mut self) -> Option<Entity> {
        debug_assert!(self.in_use > 0, "release without a held slot");
        match self.waiting.pop_front() {
            Some(next) => Some(next),
            None => {
                self.in_use = self.in_use.saturating_sub(1);
                None
            }
        }
    }
}

/// Spawn the general parking and EV charger pools.
pub fn spawn_pools(world: &mut World, parking_capacity: usize, charger_capacity: usize) -> PoolHandles {
    let general = world
        .spawn(ResourcePool::new("parking", parking_capacity))
        .id();
    let dedicated = world
        .spawn(ResourcePool::new("charger", charger_capacity))
        .id();
    PoolHandles { general, dedicated }
}
