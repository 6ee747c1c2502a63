use std::any::Any;

use log::{debug, warn};

use crate::backend::{NativeWindow, WindowDescriptor};
use crate::ecs::{Component, ComponentError, Context};
use crate::identity::Identity;

/// Owns one native window. The window is created on start and destroyed on
/// exit; graphics are bound to it right after creation.
pub struct WindowComponent {
    identity: Identity,
    descriptor: WindowDescriptor,
    window: Option<Box<dyn NativeWindow>>,
}

impl WindowComponent {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            identity: Identity::generate(),
            descriptor: WindowDescriptor {
                title: title.into(),
                width,
                height,
            },
            window: None,
        }
    }

    pub fn title(&self) -> String {
        match &self.window {
            Some(window) => window.title(),
            None => self.descriptor.title.clone(),
        }
    }

    /// Current size; the requested size while no window is open.
    pub fn size(&self) -> (u32, u32) {
        self.window
            .as_ref()
            .map(|w| w.size())
            .unwrap_or((self.descriptor.width, self.descriptor.height))
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        self.window.as_ref().map(|w| w.position())
    }

    /// True when no native window is open or the user asked to close it.
    pub fn closed(&self) -> bool {
        self.window.as_ref().map_or(true, |w| w.closed())
    }

    pub fn is_open(&self) -> bool {
        self.window.is_some()
    }
}

impl Component for WindowComponent {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn name(&self) -> &str {
        "window"
    }

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        if self.is_open() {
            warn!("Window {:?} started twice", self.descriptor.title);
            return Ok(());
        }
        let window = ctx
            .windows
            .create_window(&self.descriptor, self.identity, ctx.entity)?;
        self.window = Some(window);
        ctx.graphics.initialize()?;
        debug!(
            "Window {:?} open at {}x{}",
            self.descriptor.title, self.descriptor.width, self.descriptor.height
        );
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut Context<'_>) {
        if let Some(window) = &mut self.window {
            window.present();
        }
    }

    fn on_exit(&mut self, _ctx: &mut Context<'_>) {
        if self.window.take().is_some() {
            debug!("Destroyed window {:?}", self.descriptor.title);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
