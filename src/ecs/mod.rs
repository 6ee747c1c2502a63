//! Entity/component core
//!
//! Entities own heterogeneous, boxed components and broadcast lifecycle
//! hooks to them in insertion order. The [`World`] owns the entities.

pub mod component;
pub mod entity;
pub mod world;

pub use component::{
    Backends, Component, ComponentError, ComponentRef, Context, EventContext, Siblings,
};
pub use entity::{Entity, EntityError};
pub use world::{RegistrationError, World};
