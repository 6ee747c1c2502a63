//! The component capability contract
//!
//! A component is a boxed trait object owned by exactly one entity. The
//! entity drives its lifecycle hooks in insertion order and hands each hook a
//! [`Siblings`] view over the other components of the same entity, which is
//! how one component reaches another it depends on without owning it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::PathBuf;

use thiserror::Error;

use super::Entity;
use crate::backend::{BackendError, GraphicsBackend, WindowBackend};
use crate::components::WindowComponent;
use crate::event::Event;
use crate::identity::Identity;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("required {kind} component {identity} is not attached to this entity")]
    MissingDependency {
        kind: &'static str,
        identity: Identity,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A unit of behaviour attached to an entity.
///
/// `on_start` may fail; the owning entity logs the failure and the component
/// stays registered, so every hook must tolerate running after a failed
/// start. `on_exit` runs exactly once, right before the component is dropped.
pub trait Component: Any {
    fn identity(&self) -> Identity;

    /// Short human-readable kind, used in logs.
    fn name(&self) -> &str;

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError>;

    fn on_update(&mut self, ctx: &mut Context<'_>);

    /// Called for every event from every window. Components tied to one
    /// window compare `origin` against their own window and ignore the rest.
    fn on_event(
        &mut self,
        _event: &Event,
        _origin: &ComponentRef<WindowComponent>,
        _ctx: &mut EventContext<'_>,
    ) {
    }

    fn on_exit(&mut self, ctx: &mut Context<'_>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<'c> dyn Component + 'c {
    /// Narrows to a concrete component type; `None` on mismatch.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Non-owning, typed reference to a component of the same entity.
///
/// Only the identity is stored. Resolving goes through the owner, so a
/// reference to a component that is gone resolves to `None` instead of
/// dangling.
pub struct ComponentRef<T> {
    identity: Identity,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentRef<T> {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            _marker: PhantomData,
        }
    }

    pub fn to(component: &T) -> Self {
        Self::new(component.identity())
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn resolve<'e>(&self, entity: &'e Entity) -> Option<&'e T> {
        entity.component::<T>(&self.identity)
    }

    pub fn resolve_mut<'e>(&self, entity: &'e mut Entity) -> Option<&'e mut T> {
        entity.component_mut::<T>(&self.identity)
    }
}

impl<T> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentRef<T> {}

impl<T> PartialEq for ComponentRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl<T> Eq for ComponentRef<T> {}

impl<T> Hash for ComponentRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl<T> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ComponentRef<{}>({})",
            std::any::type_name::<T>(),
            self.identity
        )
    }
}

/// Read access to every component of an entity except the one whose hook is
/// running.
#[derive(Clone, Copy)]
pub struct Siblings<'a> {
    before: &'a [Box<dyn Component>],
    after: &'a [Box<dyn Component>],
    index: &'a HashMap<Identity, usize>,
    position: usize,
}

impl<'a> Siblings<'a> {
    pub(crate) fn new(
        before: &'a [Box<dyn Component>],
        after: &'a [Box<dyn Component>],
        index: &'a HashMap<Identity, usize>,
        position: usize,
    ) -> Self {
        Self {
            before,
            after,
            index,
            position,
        }
    }

    /// A view with no siblings, for driving a component outside an entity.
    pub fn empty(index: &'a HashMap<Identity, usize>) -> Self {
        Self {
            before: &[],
            after: &[],
            index,
            position: 0,
        }
    }

    pub fn get_dyn(&self, identity: &Identity) -> Option<&'a dyn Component> {
        let slot = *self.index.get(identity)?;
        let component = if slot < self.position {
            self.before.get(slot)?
        } else if slot > self.position {
            self.after.get(slot - self.position - 1)?
        } else {
            return None;
        };
        Some(component.as_ref())
    }

    pub fn get<T: Component>(&self, reference: &ComponentRef<T>) -> Option<&'a T> {
        self.get_dyn(&reference.identity())?.downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The backends a lifecycle broadcast runs against.
pub struct Backends<'a> {
    pub windows: &'a mut dyn WindowBackend,
    pub graphics: &'a mut dyn GraphicsBackend,
}

/// Passed to `on_start`, `on_update` and `on_exit`.
pub struct Context<'a> {
    /// Identity of the owning entity.
    pub entity: Identity,
    pub siblings: Siblings<'a>,
    pub windows: &'a mut dyn WindowBackend,
    pub graphics: &'a mut dyn GraphicsBackend,
}

/// Passed to `on_event`. The window backend is mid-poll while events are
/// dispatched, so only the graphics side is reachable.
pub struct EventContext<'a> {
    pub entity: Identity,
    pub siblings: Siblings<'a>,
    pub graphics: &'a mut dyn GraphicsBackend,
}
