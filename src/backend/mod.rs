//! Contracts for the windowing and graphics collaborators
//!
//! The core never talks to a native API directly. A [`WindowBackend`] owns
//! the platform event queue and hands out [`NativeWindow`]s; a
//! [`GraphicsBackend`] compiles shaders, uploads meshes and submits draws.
//! Handles returned by the graphics side are opaque to everything but the
//! backend that issued them.
//!
//! [`headless`] provides in-process implementations of both contracts for
//! tests and for running without a display.

use std::path::{Path, PathBuf};

use glam::Mat4;
use thiserror::Error;

use crate::event::RawEvent;
use crate::identity::Identity;

pub mod headless;

pub use headless::{GraphicsCommand, GraphicsLog, HeadlessHandle, HeadlessWindows, RecordingGraphics};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("window backend failed to initialize: {0}")]
    Initialization(String),
    #[error("window backend is not initialized")]
    NotInitialized,
    #[error("failed to create window {title:?}: {reason}")]
    WindowCreation { title: String, reason: String },
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("failed to load texture {}: {reason}", .path.display())]
    TextureLoad { path: PathBuf, reason: String },
    #[error("graphics backend has no current context")]
    NoContext,
}

/// Parameters for opening a native window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// Platform window layer.
///
/// `poll_events` is the only place where control passes to the platform.
/// Every pending event is delivered to `sink` before it returns, tagged with
/// the window component and entity identities given at `create_window`.
pub trait WindowBackend {
    fn initialize(&mut self) -> Result<(), BackendError>;

    fn terminate(&mut self);

    fn create_window(
        &mut self,
        descriptor: &WindowDescriptor,
        window: Identity,
        entity: Identity,
    ) -> Result<Box<dyn NativeWindow>, BackendError>;

    fn poll_events(&mut self, sink: &mut dyn FnMut(RawEvent));
}

/// A live platform window. Dropping it destroys the window.
pub trait NativeWindow {
    fn title(&self) -> String;

    fn size(&self) -> (u32, u32);

    fn position(&self) -> (i32, i32);

    fn closed(&self) -> bool;

    /// Swaps the window's buffers.
    fn present(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Texture sampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], colour: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            colour,
            uv,
        }
    }
}

/// One triangle, as three vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Index {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Index {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn offset(self, by: u32) -> Self {
        Self {
            a: self.a + by,
            b: self.b + by,
            c: self.c + by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub window: Identity,
    pub mesh: MeshHandle,
    pub shader: Option<ShaderHandle>,
    pub texture: Option<TextureHandle>,
    pub index_count: u32,
}

/// GPU-facing layer.
pub trait GraphicsBackend {
    /// Binds the graphics API to the most recently created window.
    fn initialize(&mut self) -> Result<(), BackendError>;

    fn compile_shader(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, BackendError>;

    fn load_texture(&mut self, path: &Path, filter: Filter) -> Result<TextureInfo, BackendError>;

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[Index])
        -> Result<MeshHandle, BackendError>;

    fn update_mesh(&mut self, mesh: MeshHandle, vertices: &[Vertex], indices: &[Index]);

    fn set_viewport(&mut self, window: Identity, width: u32, height: u32);

    fn set_view_projection(&mut self, window: Identity, view_projection: Mat4);

    fn draw(&mut self, call: &DrawCall);

    fn release_mesh(&mut self, mesh: MeshHandle);

    fn release_shader(&mut self, shader: ShaderHandle);

    fn release_texture(&mut self, texture: TextureHandle);
}
