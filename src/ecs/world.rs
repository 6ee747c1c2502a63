//! World - the registry of entities

use std::collections::HashMap;

use log::{debug, error};
use thiserror::Error;

use super::component::{Backends, ComponentRef};
use super::Entity;
use crate::backend::GraphicsBackend;
use crate::components::WindowComponent;
use crate::event::Event;
use crate::identity::Identity;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("entity {0} is already registered")]
    Duplicate(Identity),
    #[error("entity {0} was registered after the run loop started")]
    Late(Identity),
}

/// Owns every entity. Broadcasts visit entities in registration order.
///
/// Registration closes once the start broadcast has run; entities only
/// receive `on_start` once, so anything added later would never start.
#[derive(Default)]
pub struct World {
    entities: Vec<Entity>,
    index: HashMap<Identity, usize>,
    sealed: bool,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: Entity) -> Result<Identity, RegistrationError> {
        let id = entity.identity();
        if self.sealed {
            return Err(RegistrationError::Late(id));
        }
        if self.index.contains_key(&id) {
            return Err(RegistrationError::Duplicate(id));
        }
        debug!(
            "Registering entity {:?} ({}) with {} components",
            entity.label(),
            id,
            entity.len()
        );
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        Ok(id)
    }

    /// Looks up an entity. An unknown identity is logged as an error.
    pub fn entity(&self, id: &Identity) -> Option<&Entity> {
        match self.index.get(id) {
            Some(slot) => self.entities.get(*slot),
            None => {
                error!("Requested entity {id} does not exist");
                None
            }
        }
    }

    pub fn entity_mut(&mut self, id: &Identity) -> Option<&mut Entity> {
        match self.index.get(id) {
            Some(slot) => self.entities.get_mut(*slot),
            None => {
                error!("Requested entity {id} does not exist");
                None
            }
        }
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.index.contains_key(id)
    }

    /// Resolves a window component through its owning entity.
    pub fn window(
        &self,
        entity: &Identity,
        window: &ComponentRef<WindowComponent>,
    ) -> Option<&WindowComponent> {
        self.entity(entity)?.get(window)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Closes registration and starts every entity.
    pub(crate) fn start(&mut self, backends: &mut Backends<'_>) {
        self.sealed = true;
        for entity in &mut self.entities {
            entity.on_start(backends);
        }
    }

    pub(crate) fn update(&mut self, backends: &mut Backends<'_>) {
        for entity in &mut self.entities {
            entity.on_update(backends);
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        event: &Event,
        origin: &ComponentRef<WindowComponent>,
        graphics: &mut dyn GraphicsBackend,
    ) {
        for entity in &mut self.entities {
            entity.on_event(event, origin, &mut *graphics);
        }
    }

    /// Runs each entity's exit broadcast and destroys it, in registration
    /// order. The world is empty afterwards.
    pub(crate) fn shutdown(&mut self, backends: &mut Backends<'_>) {
        self.index.clear();
        for mut entity in self.entities.drain(..) {
            entity.on_exit(backends);
            debug!("Destroyed entity {:?} ({})", entity.label(), entity.identity());
        }
    }
}
