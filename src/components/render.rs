use std::any::Any;

use log::{debug, trace};

use super::{ShaderComponent, TextureComponent, WindowComponent};
use crate::backend::{DrawCall, Index, MeshHandle, Vertex};
use crate::ecs::{Component, ComponentError, ComponentRef, Context, EventContext};
use crate::event::{Event, WindowResizeEvent};
use crate::identity::Identity;

/// Draws a CPU-side mesh into one window every tick.
///
/// Geometry is given in pixels with the origin at the window centre. It is
/// converted to clip space at upload time using the current window size, and
/// re-uploaded whenever that window is resized.
pub struct RenderComponent {
    identity: Identity,
    window: ComponentRef<WindowComponent>,
    shader: Option<ComponentRef<ShaderComponent>>,
    texture: Option<ComponentRef<TextureComponent>>,
    size: (u32, u32),
    vertices: Vec<Vertex>,
    indices: Vec<Index>,
    mesh: Option<MeshHandle>,
    dirty: bool,
}

impl RenderComponent {
    pub fn new(window: ComponentRef<WindowComponent>) -> Self {
        Self {
            identity: Identity::generate(),
            window,
            shader: None,
            texture: None,
            size: (0, 0),
            vertices: Vec::new(),
            indices: Vec::new(),
            mesh: None,
            dirty: false,
        }
    }

    pub fn with_shader(mut self, shader: ComponentRef<ShaderComponent>) -> Self {
        self.shader = Some(shader);
        self
    }

    pub fn with_texture(mut self, texture: ComponentRef<TextureComponent>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn window(&self) -> ComponentRef<WindowComponent> {
        self.window
    }

    /// Appends geometry. `indices` refer to `vertices` and are rebased onto
    /// the vertices already held.
    pub fn add_geometry(&mut self, vertices: &[Vertex], indices: &[Index]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.indices
            .extend(indices.iter().map(|index| index.offset(base)));
        self.dirty = true;
    }

    pub fn clear_geometry(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.dirty = true;
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        (self.indices.len() * 3) as u32
    }

    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    /// Size of the target window as last observed.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clip_vertices(&self) -> Vec<Vertex> {
        let sx = 2.0 / self.size.0.max(1) as f32;
        let sy = 2.0 / self.size.1.max(1) as f32;
        self.vertices
            .iter()
            .map(|v| {
                let [x, y, z] = v.position;
                Vertex {
                    position: [x * sx, y * sy, z],
                    ..*v
                }
            })
            .collect()
    }
}

impl Component for RenderComponent {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn name(&self) -> &str {
        "render"
    }

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let window = ctx
            .siblings
            .get(&self.window)
            .ok_or(ComponentError::MissingDependency {
                kind: "window",
                identity: self.window.identity(),
            })?;
        self.size = window.size();
        let mesh = ctx
            .graphics
            .create_mesh(&self.clip_vertices(), &self.indices)?;
        self.mesh = Some(mesh);
        self.dirty = false;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut Context<'_>) {
        let Some(mesh) = self.mesh else {
            trace!("Render component {} has no mesh", self.identity);
            return;
        };
        if self.dirty {
            ctx.graphics
                .update_mesh(mesh, &self.clip_vertices(), &self.indices);
            self.dirty = false;
        }
        if self.indices.is_empty() {
            return;
        }
        let shader = self
            .shader
            .and_then(|r| ctx.siblings.get(&r))
            .and_then(|s| s.program());
        let texture = self
            .texture
            .and_then(|r| ctx.siblings.get(&r))
            .and_then(|t| t.handle());
        ctx.graphics.draw(&DrawCall {
            window: self.window.identity(),
            mesh,
            shader,
            texture,
            index_count: self.index_count(),
        });
    }

    fn on_event(
        &mut self,
        event: &Event,
        origin: &ComponentRef<WindowComponent>,
        ctx: &mut EventContext<'_>,
    ) {
        if self.mesh.is_none() || *origin != self.window {
            return;
        }
        if let Some(resize) = event.get::<WindowResizeEvent>() {
            ctx.graphics
                .set_viewport(self.window.identity(), resize.width, resize.height);
            self.size = (resize.width, resize.height);
            self.dirty = true;
        }
    }

    fn on_exit(&mut self, ctx: &mut Context<'_>) {
        if let Some(mesh) = self.mesh.take() {
            ctx.graphics.release_mesh(mesh);
            debug!("Released mesh {:?}", mesh);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
