use std::any::Any;

use glam::{Mat4, Vec2, Vec3};
use log::debug;

use super::WindowComponent;
use crate::ecs::{Component, ComponentError, ComponentRef, Context, EventContext};
use crate::event::{Event, WindowResizeEvent};
use crate::identity::Identity;

const NEAR: f32 = -1.0;
const FAR: f32 = 1.0;

/// Orthographic 2D camera bound to one window.
///
/// One world unit maps to one pixel at zoom 1, with the origin at the centre
/// of the window.
pub struct CameraComponent {
    identity: Identity,
    window: ComponentRef<WindowComponent>,
    position: Vec2,
    zoom: f32,
    viewport: (u32, u32),
    started: bool,
}

impl CameraComponent {
    pub fn new(window: ComponentRef<WindowComponent>) -> Self {
        Self {
            identity: Identity::generate(),
            window,
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (0, 0),
            started: false,
        }
    }

    pub fn window(&self) -> ComponentRef<WindowComponent> {
        self.window
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Non-positive or non-finite zoom levels are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn projection(&self) -> Mat4 {
        let half_w = self.viewport.0.max(1) as f32 / 2.0 / self.zoom;
        let half_h = self.viewport.1.max(1) as f32 / 2.0 / self.zoom;
        Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, NEAR, FAR)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(-self.position.extend(0.0))
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Maps a world-space point to normalized device coordinates.
    pub fn to_clip(&self, point: Vec2) -> Vec2 {
        let projected = self.view_projection().project_point3(Vec3::new(point.x, point.y, 0.0));
        projected.truncate()
    }
}

impl Component for CameraComponent {
    fn identity(&self) -> Identity {
        self.identity
    }

    fn name(&self) -> &str {
        "camera"
    }

    fn on_start(&mut self, ctx: &mut Context<'_>) -> Result<(), ComponentError> {
        let window = ctx
            .siblings
            .get(&self.window)
            .ok_or(ComponentError::MissingDependency {
                kind: "window",
                identity: self.window.identity(),
            })?;
        self.viewport = window.size();
        self.started = true;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut Context<'_>) {
        if self.started {
            ctx.graphics
                .set_view_projection(self.window.identity(), self.view_projection());
        }
    }

    fn on_event(
        &mut self,
        event: &Event,
        origin: &ComponentRef<WindowComponent>,
        _ctx: &mut EventContext<'_>,
    ) {
        if *origin != self.window {
            return;
        }
        if let Some(resize) = event.get::<WindowResizeEvent>() {
            debug!("Camera viewport now {}x{}", resize.width, resize.height);
            self.viewport = (resize.width, resize.height);
        }
    }

    fn on_exit(&mut self, _ctx: &mut Context<'_>) {
        self.started = false;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(width: u32, height: u32) -> CameraComponent {
        let mut camera = CameraComponent::new(ComponentRef::new(Identity::generate()));
        camera.viewport = (width, height);
        camera
    }

    #[test]
    fn test_window_edges_map_to_clip_edges() {
        let camera = camera(800, 600);
        assert!(camera.to_clip(Vec2::ZERO).abs_diff_eq(Vec2::ZERO, 1e-6));
        assert!(camera
            .to_clip(Vec2::new(400.0, 300.0))
            .abs_diff_eq(Vec2::new(1.0, 1.0), 1e-6));
        assert!(camera
            .to_clip(Vec2::new(-400.0, -300.0))
            .abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-6));
    }

    #[test]
    fn test_position_and_zoom_shift_the_view() {
        let mut camera = camera(800, 600);
        camera.set_position(Vec2::new(100.0, 0.0));
        assert!(camera
            .to_clip(Vec2::new(100.0, 0.0))
            .abs_diff_eq(Vec2::ZERO, 1e-6));

        camera.set_zoom(2.0);
        assert!(camera
            .to_clip(Vec2::new(300.0, 0.0))
            .abs_diff_eq(Vec2::new(1.0, 0.0), 1e-6));

        camera.set_zoom(0.0);
        assert_eq!(camera.zoom(), 2.0);
    }
}
