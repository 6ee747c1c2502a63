pub mod backend;
pub mod components;
pub mod config;
pub mod ecs;
pub mod engine;
pub mod event;
pub mod identity;
pub mod logging;

pub use config::EngineConfig;
pub use ecs::{Component, ComponentRef, Entity, World};
pub use engine::{Application, Engine, EngineError, ExitCode, Outcome, Phase};
pub use event::Event;
pub use identity::Identity;
