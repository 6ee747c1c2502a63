use std::any::Any;
use std::path::{Path, PathBuf};

use log::debug;

use crate::backend::{Filter, TextureHandle, TextureInfo};
use crate::ecs::{Component, ComponentError, Context};
use crate::identity::Identity;

/// An image loaded into the graphics backend on start.
pub struct TextureComponent {
    identity: Identity,
    path: PathBuf,
    filter: Filter,
    info: Option<TextureInfo>,
}

impl TextureComponent {
    pub fn new(path: impl Into<PathBuf>, filter: Filter) -> Self {
        Self {
            identity: Identity::generate(),
            path: path.into(),
            filter,
            info: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn handle(&self) -> Option<TextureHandle> {
        self.info.map(|info| info.handle)
    }

    pub fn width(&self) -> u32 {
        self.info.map_or(0, |info| info.width)
    }

    pub fn height(&self) -> u32 {
        self.info.map_or(0, |info| info.height)
    }

    pub fn channels(&self) -> u8 {
        self.info.map_or(0, |info| info.channels)
    }
}

impl Component for TextureComponent {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn name(&self) -> &str {
        "texture"
    }

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let info = ctx.graphics.load_texture(&self.path, self.filter)?;
        debug!(
            "Loaded texture {} ({}x{}, {} channels)",
            self.path.display(),
            info.width,
            info.height,
            info.channels
        );
        self.info = Some(info);
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut Context<'_>) {}

    fn on_exit(&mut self, ctx: &mut Context<'_>) {
        if let Some(info) = self.info.take() {
            ctx.graphics.release_texture(info.handle);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
