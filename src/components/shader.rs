use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::backend::ShaderHandle;
use crate::ecs::{Component, ComponentError, Context};
use crate::identity::Identity;

enum ShaderSource {
    Files { vertex: PathBuf, fragment: PathBuf },
    Inline { vertex: String, fragment: String },
}

/// A compiled vertex + fragment program.
///
/// Compilation happens on start. If reading or compiling fails the component
/// has no program and renderers referring to it draw unshaded.
pub struct ShaderComponent {
    identity: Identity,
    source: ShaderSource,
    program: Option<ShaderHandle>,
}

impl ShaderComponent {
    pub fn new(vertex_path: impl Into<PathBuf>, fragment_path: impl Into<PathBuf>) -> Self {
        Self::with_source(ShaderSource::Files {
            vertex: vertex_path.into(),
            fragment: fragment_path.into(),
        })
    }

    pub fn from_source(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::with_source(ShaderSource::Inline {
            vertex: vertex.into(),
            fragment: fragment.into(),
        })
    }

    fn with_source(source: ShaderSource) -> Self {
        Self {
            identity: Identity::generate(),
            source,
            program: None,
        }
    }

    pub fn program(&self) -> Option<ShaderHandle> {
        self.program
    }

    fn read_sources(&self) -> Result<(String, String), ComponentError> {
        match &self.source {
            ShaderSource::Files { vertex, fragment } => Ok((read(vertex)?, read(fragment)?)),
            ShaderSource::Inline { vertex, fragment } => Ok((vertex.clone(), fragment.clone())),
        }
    }
}

fn read(path: &Path) -> Result<String, ComponentError> {
    fs::read_to_string(path).map_err(|source| ComponentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Component for ShaderComponent {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn name(&self) -> &str {
        "shader"
    }

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let (vertex, fragment) = self.read_sources()?;
        let program = ctx.graphics.compile_shader(&vertex, &fragment)?;
        debug!("Compiled shader program {:?}", program);
        self.program = Some(program);
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut Context<'_>) {}

    fn on_exit(&mut self, ctx: &mut Context<'_>) {
        if let Some(program) = self.program.take() {
            ctx.graphics.release_shader(program);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
