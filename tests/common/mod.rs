#![allow(dead_code)]

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use tickwork::backend::{GraphicsLog, HeadlessHandle, HeadlessWindows, RecordingGraphics};
use tickwork::components::WindowComponent;
use tickwork::ecs::{ComponentError, Context, EventContext};
use tickwork::engine::{Application, Engine, ExitCode};
use tickwork::event::Event;
use tickwork::{Component, ComponentRef, EngineConfig, Entity, Identity, World};

pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .borrow()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

/// Records every hook it receives. When bound to a window, only events from
/// that window are recorded.
pub struct Probe {
    id: Identity,
    tag: String,
    journal: Journal,
    window: Option<ComponentRef<WindowComponent>>,
    pub events_seen: usize,
}

impl Probe {
    pub fn new(tag: &str, journal: &Journal) -> Self {
        Self {
            id: Identity::generate(),
            tag: tag.to_string(),
            journal: Rc::clone(journal),
            window: None,
            events_seen: 0,
        }
    }

    pub fn bound_to(mut self, window: ComponentRef<WindowComponent>) -> Self {
        self.window = Some(window);
        self
    }

    fn record(&self, entry: String) {
        self.journal.borrow_mut().push(entry);
    }
}

impl Component for Probe {
    fn identity(&self) -> Identity {
        self.id
    }

    fn name(&self) -> &str {
        "probe"
    }

    fn on_start(&mut self, _ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        self.record(format!("start:{}", self.tag));
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut Context<'_>) {
        self.record(format!("update:{}", self.tag));
    }

    fn on_event(
        &mut self,
        event: &Event,
        origin: &ComponentRef<WindowComponent>,
        _ctx: &mut EventContext<'_>,
    ) {
        if let Some(window) = &self.window {
            if window != origin {
                return;
            }
        }
        self.events_seen += 1;
        self.record(format!("event:{}:{:?}", self.tag, event.kind()));
    }

    fn on_exit(&mut self, _ctx: &mut Context<'_>) {
        self.record(format!("exit:{}", self.tag));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        self.journal
            .borrow_mut()
            .push(format!("drop:{}", self.tag));
    }
}

type UpdateHook = Box<dyn FnMut(&mut World, u64) -> ExitCode>;
type EventHook = Box<dyn FnMut(&Event, &WindowComponent) -> ExitCode>;

/// An application driven by canned answers.
///
/// Registers `entities` on enter, then asks `update` what to do on each
/// tick (the tick number starts at 1).
pub struct Script {
    pub journal: Journal,
    pub entities: Vec<Entity>,
    pub enter: ExitCode,
    pub update: UpdateHook,
    pub event: EventHook,
    pub exit: ExitCode,
    pub ticks: u64,
    pub registered: Vec<Identity>,
}

impl Script {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            entities: Vec::new(),
            enter: ExitCode::Success,
            update: Box::new(|_, _| ExitCode::Exit),
            event: Box::new(|_, _| ExitCode::Success),
            exit: ExitCode::Success,
            ticks: 0,
            registered: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Keeps running until `ticks` updates have succeeded, then exits.
    pub fn run_for(mut self, ticks: u64) -> Self {
        self.update = Box::new(move |_, tick| {
            if tick > ticks {
                ExitCode::Exit
            } else {
                ExitCode::Success
            }
        });
        self
    }

    pub fn on_update(mut self, hook: impl FnMut(&mut World, u64) -> ExitCode + 'static) -> Self {
        self.update = Box::new(hook);
        self
    }

    pub fn on_event(
        mut self,
        hook: impl FnMut(&Event, &WindowComponent) -> ExitCode + 'static,
    ) -> Self {
        self.event = Box::new(hook);
        self
    }
}

impl Application for Script {
    fn on_enter(&mut self, world: &mut World) -> ExitCode {
        self.journal.borrow_mut().push("app:enter".to_string());
        for entity in self.entities.drain(..) {
            match world.add_entity(entity) {
                Ok(id) => self.registered.push(id),
                Err(_) => return ExitCode::Error,
            }
        }
        self.enter
    }

    fn on_update(&mut self, world: &mut World) -> ExitCode {
        self.ticks += 1;
        self.journal.borrow_mut().push("app:update".to_string());
        (self.update)(world, self.ticks)
    }

    fn on_exit(&mut self, _world: &mut World) -> ExitCode {
        self.journal.borrow_mut().push("app:exit".to_string());
        self.exit
    }

    fn on_event(&mut self, event: &Event, window: &WindowComponent) -> ExitCode {
        self.journal
            .borrow_mut()
            .push(format!("app:event:{:?}", event.kind()));
        (self.event)(event, window)
    }
}

pub struct Harness {
    pub engine: Engine,
    pub windows: HeadlessHandle,
    pub graphics: GraphicsLog,
}

pub fn harness() -> Harness {
    tickwork::logging::init_for_tests();
    let config = EngineConfig {
        tick_rate_hz: None,
        ..EngineConfig::default()
    };
    let windows = HeadlessWindows::new();
    let graphics = RecordingGraphics::new();
    let handle = windows.handle();
    let log = graphics.log();
    Harness {
        engine: Engine::new(&config, Box::new(windows), Box::new(graphics)),
        windows: handle,
        graphics: log,
    }
}
