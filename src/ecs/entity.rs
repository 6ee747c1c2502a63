//! Entity: an identity plus an ordered set of owned components

use std::collections::HashMap;

use log::{debug, error};
use thiserror::Error;

use super::component::{Backends, Component, ComponentRef, Context, EventContext, Siblings};
use crate::backend::GraphicsBackend;
use crate::components::WindowComponent;
use crate::event::Event;
use crate::identity::Identity;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    #[error("component {component} is already attached to entity {entity}")]
    DuplicateComponent { component: Identity, entity: Identity },
}

/// Owns its components. Lifecycle broadcasts visit them in the order they
/// were added.
pub struct Entity {
    identity: Identity,
    label: String,
    components: Vec<Box<dyn Component>>,
    index: HashMap<Identity, usize>,
}

impl Entity {
    /// Creates an entity with a fresh identity. The label only shows up in
    /// logs and need not be unique.
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_identity(Identity::generate(), label)
    }

    pub fn with_identity(identity: Identity, label: impl Into<String>) -> Self {
        Self {
            identity,
            label: label.into(),
            components: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Takes ownership of `component` and returns a typed reference to it.
    pub fn add_component<T: Component>(
        &mut self,
        component: T,
    ) -> Result<ComponentRef<T>, EntityError> {
        let reference = ComponentRef::to(&component);
        self.add_boxed(Box::new(component))?;
        Ok(reference)
    }

    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> Result<Identity, EntityError> {
        let id = component.identity();
        if self.index.contains_key(&id) {
            return Err(EntityError::DuplicateComponent {
                component: id,
                entity: self.identity,
            });
        }
        debug!(
            "Adding {} component {} to entity {:?}",
            component.name(),
            id,
            self.label
        );
        self.index.insert(id, self.components.len());
        self.components.push(component);
        Ok(id)
    }

    /// Looks up a component by identity and narrows it to `T`.
    ///
    /// An identity that is not attached here is logged as an error; a type
    /// mismatch is not.
    pub fn component<T: Component>(&self, id: &Identity) -> Option<&T> {
        let component = self.component_dyn(id)?;
        let narrowed = component.downcast_ref::<T>();
        if narrowed.is_none() {
            debug!(
                "Component {} of entity {:?} is a {}, not the requested type",
                id,
                self.label,
                component.name()
            );
        }
        narrowed
    }

    pub fn component_mut<T: Component>(&mut self, id: &Identity) -> Option<&mut T> {
        let slot = self.slot(id)?;
        let component = self.components[slot].as_mut();
        if !component.is::<T>() {
            debug!(
                "Component {} of entity {:?} is a {}, not the requested type",
                id,
                self.label,
                component.name()
            );
        }
        component.downcast_mut::<T>()
    }

    pub fn component_dyn(&self, id: &Identity) -> Option<&dyn Component> {
        let slot = self.slot(id)?;
        Some(self.components[slot].as_ref())
    }

    fn slot(&self, id: &Identity) -> Option<usize> {
        let slot = self.index.get(id).copied();
        if slot.is_none() {
            error!(
                "Requested component {} does not exist in entity {:?}",
                id, self.label
            );
        }
        slot
    }

    pub fn get<T: Component>(&self, reference: &ComponentRef<T>) -> Option<&T> {
        reference.resolve(self)
    }

    pub fn get_mut<T: Component>(&mut self, reference: &ComponentRef<T>) -> Option<&mut T> {
        reference.resolve_mut(self)
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.index.contains_key(id)
    }

    /// First component of type `T`, in insertion order.
    pub fn find<T: Component>(&self) -> Option<&T> {
        self.components.iter().find_map(|c| c.downcast_ref::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Component + 'static)> {
        self.components.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn on_start(&mut self, backends: &mut Backends<'_>) {
        let Entity {
            identity,
            label,
            components,
            index,
        } = self;
        let entity = *identity;
        broadcast(components, index, |component, siblings| {
            let mut ctx = Context {
                entity,
                siblings,
                windows: &mut *backends.windows,
                graphics: &mut *backends.graphics,
            };
            if let Err(err) = component.on_start(&mut ctx) {
                error!(
                    "{} component {} of entity {:?} failed to start: {}",
                    component.name(),
                    component.identity(),
                    label,
                    err
                );
            }
        });
    }

    pub fn on_update(&mut self, backends: &mut Backends<'_>) {
        let entity = self.identity;
        broadcast(&mut self.components, &self.index, |component, siblings| {
            let mut ctx = Context {
                entity,
                siblings,
                windows: &mut *backends.windows,
                graphics: &mut *backends.graphics,
            };
            component.on_update(&mut ctx);
        });
    }

    pub fn on_event(
        &mut self,
        event: &Event,
        origin: &ComponentRef<WindowComponent>,
        graphics: &mut dyn GraphicsBackend,
    ) {
        let entity = self.identity;
        broadcast(&mut self.components, &self.index, |component, siblings| {
            let mut ctx = EventContext {
                entity,
                siblings,
                graphics: &mut *graphics,
            };
            component.on_event(event, origin, &mut ctx);
        });
    }

    /// Runs every component's exit hook, then drops the components in
    /// insertion order.
    pub fn on_exit(&mut self, backends: &mut Backends<'_>) {
        let entity = self.identity;
        broadcast(&mut self.components, &self.index, |component, siblings| {
            let mut ctx = Context {
                entity,
                siblings,
                windows: &mut *backends.windows,
                graphics: &mut *backends.graphics,
            };
            component.on_exit(&mut ctx);
        });

        self.index.clear();
        for component in self.components.drain(..) {
            debug!(
                "Destroying {} component {} of entity {:?}",
                component.name(),
                component.identity(),
                self.label
            );
        }
    }
}

/// Visits every component in order, handing it a view over the others.
fn broadcast(
    components: &mut [Box<dyn Component>],
    index: &HashMap<Identity, usize>,
    mut visit: impl FnMut(&mut dyn Component, Siblings<'_>),
) {
    for position in 0..components.len() {
        let (before, rest) = components.split_at_mut(position);
        if let Some((current, after)) = rest.split_first_mut() {
            let siblings = Siblings::new(before, after, index, position);
            visit(current.as_mut(), siblings);
        }
    }
}
