use std::any::Any;

use glam::Vec2;

use super::{RenderComponent, ShaderComponent, TextureComponent, WindowComponent};
use crate::backend::{Index, Vertex};
use crate::ecs::{Component, ComponentError, ComponentRef, Context, EventContext};
use crate::event::Event;
use crate::identity::Identity;

const DEFAULT_SIZE: f32 = 64.0;

/// A coloured, optionally textured quad.
pub struct SpriteComponent {
    identity: Identity,
    size: Vec2,
    position: Vec2,
    colour: [f32; 3],
    render: RenderComponent,
}

impl SpriteComponent {
    pub fn new(window: ComponentRef<WindowComponent>) -> Self {
        let mut sprite = Self {
            identity: Identity::generate(),
            size: Vec2::splat(DEFAULT_SIZE),
            position: Vec2::ZERO,
            colour: [1.0, 1.0, 1.0],
            render: RenderComponent::new(window),
        };
        sprite.rebuild();
        sprite
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self.rebuild();
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self.rebuild();
        self
    }

    pub fn with_colour(mut self, colour: [f32; 3]) -> Self {
        self.colour = colour;
        self.rebuild();
        self
    }

    pub fn with_shader(mut self, shader: ComponentRef<ShaderComponent>) -> Self {
        self.render = self.render.with_shader(shader);
        self
    }

    pub fn with_texture(mut self, texture: ComponentRef<TextureComponent>) -> Self {
        self.render = self.render.with_texture(texture);
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.rebuild();
    }

    pub fn colour(&self) -> [f32; 3] {
        self.colour
    }

    pub fn render(&self) -> &RenderComponent {
        &self.render
    }

    fn rebuild(&mut self) {
        let half = self.size / 2.0;
        let (x, y) = (self.position.x, self.position.y);
        let c = self.colour;
        let vertices = [
            Vertex::new([x + half.x, y + half.y, 0.0], c, [1.0, 1.0]),
            Vertex::new([x + half.x, y - half.y, 0.0], c, [1.0, 0.0]),
            Vertex::new([x - half.x, y - half.y, 0.0], c, [0.0, 0.0]),
            Vertex::new([x - half.x, y + half.y, 0.0], c, [0.0, 1.0]),
        ];
        let indices = [Index::new(0, 1, 3), Index::new(1, 2, 3)];
        self.render.clear_geometry();
        self.render.add_geometry(&vertices, &indices);
    }
}

impl Component for SpriteComponent {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn name(&self) -> &str {
        "sprite"
    }

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        self.render.on_start(ctx)
    }

    fn on_update(&mut self, ctx: &mut Context<'_>) {
        self.render.on_update(ctx);
    }

    fn on_event(
        &mut self,
        event: &Event,
        origin: &ComponentRef<WindowComponent>,
        ctx: &mut EventContext<'_>,
    ) {
        self.render.on_event(event, origin, ctx);
    }

    fn on_exit(&mut self, ctx: &mut Context<'_>) {
        self.render.on_exit(ctx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
