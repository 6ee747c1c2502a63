//! The run loop
//!
//! [`Engine::run`] drives one [`Application`] through
//! `Uninitialized -> Entering -> Running -> Exiting -> Terminated`:
//!
//! 1. initialize the window backend and call `on_enter`, where the
//!    application registers its entities;
//! 2. start every entity, then tick: `on_update`, the entity update
//!    broadcast, and one event poll per tick;
//! 3. call `on_exit`, tear every entity down in registration order and
//!    terminate the window backend.
//!
//! Errors from `on_enter` and `on_exit` end the run on the spot without
//! tearing entities down. Errors from `on_update` or `on_event` only end the
//! loop; the exit phase still runs.

mod ticker;

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::backend::{BackendError, GraphicsBackend, WindowBackend};
use crate::components::WindowComponent;
use crate::config::EngineConfig;
use crate::ecs::{Backends, ComponentRef, World};
use crate::event::{Event, RawEvent};
use crate::fatal;

pub use ticker::{TickStats, Ticker};

/// What a client callback wants the run loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Exit,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Entering,
    Running,
    Exiting,
    Terminated,
}

/// How a run that reached a clean stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The loop ended on request and everything was torn down.
    Completed,
    /// `on_enter` asked to exit; nothing was started.
    ExitedOnEnter,
    /// `on_update` or `on_event` reported an error; teardown still ran.
    Aborted,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn status(self) -> i32 {
        match self {
            Outcome::Completed | Outcome::ExitedOnEnter => 0,
            Outcome::Aborted => 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("window backend failed to initialize")]
    Backend(#[from] BackendError),
    #[error("enter callback reported an error")]
    EnterFailed,
    #[error("exit callback reported an error")]
    ExitFailed,
    #[error("engine has already run")]
    AlreadyRan,
}

impl EngineError {
    pub fn status(&self) -> i32 {
        1
    }
}

/// Client hooks. The world passed in is the engine's; entities registered
/// during `on_enter` are started when the loop begins.
pub trait Application {
    fn on_enter(&mut self, world: &mut World) -> ExitCode;

    fn on_update(&mut self, world: &mut World) -> ExitCode;

    fn on_exit(&mut self, world: &mut World) -> ExitCode;

    /// Sees every routed event before the entities do. `Exit` or `Error`
    /// stops the broadcast and ends the loop.
    fn on_event(&mut self, _event: &Event, _window: &WindowComponent) -> ExitCode {
        ExitCode::Success
    }
}

pub struct Engine {
    windows: Box<dyn WindowBackend>,
    graphics: Box<dyn GraphicsBackend>,
    world: World,
    phase: Phase,
    ticker: Ticker,
}

impl Engine {
    pub fn new(
        config: &EngineConfig,
        windows: Box<dyn WindowBackend>,
        graphics: Box<dyn GraphicsBackend>,
    ) -> Self {
        Self {
            windows,
            graphics,
            world: World::new(),
            phase: Phase::Uninitialized,
            ticker: Ticker::new(config.tick_rate_hz),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticker.tick_count()
    }

    pub fn recent_stats(&self) -> impl Iterator<Item = &TickStats> {
        self.ticker.recent_stats()
    }

    pub fn average_tick_time(&self) -> Option<Duration> {
        self.ticker.average_tick_time()
    }

    /// Runs `app` to completion. Can only be called once per engine.
    pub fn run(&mut self, app: &mut dyn Application) -> Result<Outcome, EngineError> {
        if self.phase != Phase::Uninitialized {
            return Err(EngineError::AlreadyRan);
        }
        self.phase = Phase::Entering;

        if let Err(err) = self.windows.initialize() {
            fatal!("Failed to initialize window backend: {err}");
            self.phase = Phase::Terminated;
            return Err(err.into());
        }

        match app.on_enter(&mut self.world) {
            ExitCode::Success => {}
            ExitCode::Exit => {
                debug!("Exiting program on enter");
                self.phase = Phase::Terminated;
                return Ok(Outcome::ExitedOnEnter);
            }
            ExitCode::Error => {
                fatal!("Error in enter callback, terminating");
                self.phase = Phase::Terminated;
                return Err(EngineError::EnterFailed);
            }
        }

        debug!("Starting {} entities", self.world.len());
        self.world.start(&mut Backends {
            windows: self.windows.as_mut(),
            graphics: self.graphics.as_mut(),
        });
        self.phase = Phase::Running;

        let aborted = self.run_loop(app);

        self.phase = Phase::Exiting;
        match app.on_exit(&mut self.world) {
            ExitCode::Error => {
                fatal!("Error in exit callback, terminating");
                self.phase = Phase::Terminated;
                return Err(EngineError::ExitFailed);
            }
            ExitCode::Exit | ExitCode::Success => debug!("Exiting program"),
        }

        self.world.shutdown(&mut Backends {
            windows: self.windows.as_mut(),
            graphics: self.graphics.as_mut(),
        });
        self.windows.terminate();
        self.phase = Phase::Terminated;

        info!(
            "Run finished after {} ticks (average tick {:?})",
            self.ticker.tick_count(),
            self.ticker.average_tick_time().unwrap_or_default()
        );
        Ok(if aborted {
            Outcome::Aborted
        } else {
            Outcome::Completed
        })
    }

    /// Returns true when the loop ended because of an error.
    fn run_loop(&mut self, app: &mut dyn Application) -> bool {
        loop {
            self.ticker.begin();

            match app.on_update(&mut self.world) {
                ExitCode::Success => {}
                ExitCode::Exit => {
                    debug!("Exiting program on update");
                    return false;
                }
                ExitCode::Error => {
                    fatal!("Error in update loop");
                    return true;
                }
            }

            self.world.update(&mut Backends {
                windows: self.windows.as_mut(),
                graphics: self.graphics.as_mut(),
            });

            let signal = self.poll(app);
            self.ticker.end();

            match signal {
                None => {}
                Some(ExitCode::Error) => return true,
                Some(_) => return false,
            }
        }
    }

    /// Polls the window backend once, routing every event it reports.
    /// Returns the first non-success code from the client event handler.
    fn poll(&mut self, app: &mut dyn Application) -> Option<ExitCode> {
        let Engine {
            windows,
            graphics,
            world,
            ..
        } = self;
        let mut stop = None;
        windows.poll_events(&mut |raw: RawEvent| {
            if stop.is_some() {
                debug!("Dropping {:?} event, loop is ending", raw.event.kind());
                return;
            }
            match route(world, graphics.as_mut(), &mut *app, raw) {
                ExitCode::Success => {}
                code => stop = Some(code),
            }
        });
        stop
    }
}

/// Resolves the window an event came from, lets the client see it, then
/// broadcasts it to every entity.
fn route(
    world: &mut World,
    graphics: &mut dyn GraphicsBackend,
    app: &mut dyn Application,
    raw: RawEvent,
) -> ExitCode {
    // The lookups log their own misses; check first so each miss is
    // reported once.
    let entity = match world.contains(&raw.entity) {
        true => world.entity(&raw.entity),
        false => None,
    };
    let Some(entity) = entity else {
        warn!(
            "Dropping {:?} event from unknown entity {}",
            raw.event.kind(),
            raw.entity
        );
        return ExitCode::Success;
    };
    let window = match entity.contains(&raw.window) {
        true => entity.component::<WindowComponent>(&raw.window),
        false => None,
    };
    let Some(window) = window else {
        warn!(
            "Dropping {:?} event: {} is not a window of entity {:?}",
            raw.event.kind(),
            raw.window,
            entity.label()
        );
        return ExitCode::Success;
    };

    match app.on_event(&raw.event, window) {
        ExitCode::Success => {}
        ExitCode::Exit => {
            debug!("Exiting program on event");
            return ExitCode::Exit;
        }
        ExitCode::Error => {
            fatal!("Error in event callback");
            return ExitCode::Error;
        }
    }

    let origin = ComponentRef::<WindowComponent>::new(raw.window);
    world.dispatch(&raw.event, &origin, graphics);
    ExitCode::Success
}
