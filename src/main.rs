use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use log::{error, info};

use tickwork::{
    backend::{GraphicsCommand, HeadlessHandle, HeadlessWindows, RecordingGraphics},
    components::{CameraComponent, ShaderComponent, SpriteComponent, WindowComponent},
    config::WindowConfig,
    engine::{Application, Engine, ExitCode},
    event::{Event, WindowResizeEvent},
    logging, ComponentRef, EngineConfig, Entity, Identity, World,
};

const VERTEX_SHADER: &str = "#version 330 core
layout (location = 0) in vec3 position;
layout (location = 1) in vec3 colour;
layout (location = 2) in vec2 uv;
uniform mat4 view_projection;
out vec3 v_colour;
void main() {
    gl_Position = view_projection * vec4(position, 1.0);
    v_colour = colour;
}
";

const FRAGMENT_SHADER: &str = "#version 330 core
in vec3 v_colour;
out vec4 frag;
void main() {
    frag = vec4(v_colour, 1.0);
}
";

#[derive(Debug, Parser)]
#[command(author, version, about = "Runs a headless window + sprite scene")]
struct Cli {
    /// Path to an engine config YAML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Close the window after this many frames
    #[arg(long, default_value_t = 120)]
    frames: u64,

    /// Override the configured tick rate
    #[arg(long)]
    tick_rate: Option<f64>,
}

/// Opens one window with a camera and a sprite, resizes it once and closes
/// it after a fixed number of frames.
struct Demo {
    window: WindowConfig,
    frames: u64,
    frame: u64,
    handle: HeadlessHandle,
    entity: Option<Identity>,
    window_ref: Option<ComponentRef<WindowComponent>>,
}

impl Demo {
    fn build_entity(&self) -> Result<(Entity, ComponentRef<WindowComponent>)> {
        let mut entity = Entity::new("demo");
        let window = entity.add_component(WindowComponent::new(
            self.window.title.clone(),
            self.window.width,
            self.window.height,
        ))?;
        entity.add_component(CameraComponent::new(window))?;
        let shader =
            entity.add_component(ShaderComponent::from_source(VERTEX_SHADER, FRAGMENT_SHADER))?;
        entity.add_component(
            SpriteComponent::new(window)
                .with_size(Vec2::new(128.0, 128.0))
                .with_colour([0.9, 0.4, 0.1])
                .with_shader(shader),
        )?;
        Ok((entity, window))
    }

    fn is_closed(&self, world: &World) -> bool {
        match (self.entity, self.window_ref) {
            (Some(entity), Some(window)) => world
                .window(&entity, &window)
                .map_or(true, |w| w.closed()),
            _ => true,
        }
    }
}

impl Application for Demo {
    fn on_enter(&mut self, world: &mut World) -> ExitCode {
        let (entity, window) = match self.build_entity() {
            Ok(built) => built,
            Err(err) => {
                error!("Failed to build demo entity: {err}");
                return ExitCode::Error;
            }
        };
        self.window_ref = Some(window);

        match world.add_entity(entity) {
            Ok(id) => {
                self.entity = Some(id);
                ExitCode::Success
            }
            Err(err) => {
                error!("{err}");
                ExitCode::Error
            }
        }
    }

    fn on_update(&mut self, world: &mut World) -> ExitCode {
        if self.is_closed(world) {
            return ExitCode::Exit;
        }
        self.frame += 1;
        if let Some(window) = self.window_ref {
            if self.frame == 1 {
                self.handle.push_event(
                    window.identity(),
                    WindowResizeEvent {
                        width: self.window.width * 2,
                        height: self.window.height * 2,
                    },
                );
            }
            if self.frame >= self.frames {
                self.handle.close(window.identity());
            }
        }
        ExitCode::Success
    }

    fn on_exit(&mut self, _world: &mut World) -> ExitCode {
        info!("Demo ran {} frames", self.frame);
        ExitCode::Success
    }

    fn on_event(&mut self, event: &Event, window: &WindowComponent) -> ExitCode {
        if let Some(resize) = event.get::<WindowResizeEvent>() {
            info!(
                "Window {:?} resized to {}x{}",
                window.title(),
                resize.width,
                resize.height
            );
        }
        ExitCode::Success
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(hz) = cli.tick_rate {
        config.tick_rate_hz = Some(hz);
    }
    config.validate()?;
    logging::init(&config.logging)?;

    let windows = HeadlessWindows::new();
    let graphics = RecordingGraphics::new();
    let handle = windows.handle();
    let log = graphics.log();

    let mut demo = Demo {
        window: config.window.clone(),
        frames: cli.frames.max(1),
        frame: 0,
        handle,
        entity: None,
        window_ref: None,
    };
    let mut engine = Engine::new(&config, Box::new(windows), Box::new(graphics));
    let status = match engine.run(&mut demo) {
        Ok(outcome) => {
            println!(
                "{:?} after {} ticks: {} draws, {} view-projection updates, average tick {:?}",
                outcome,
                engine.ticks(),
                log.draws().len(),
                log.count(|c| matches!(c, GraphicsCommand::ViewProjection { .. })),
                engine.average_tick_time().unwrap_or_default()
            );
            outcome.status()
        }
        Err(err) => {
            error!("{err}");
            err.status()
        }
    };

    if status != 0 {
        std::process::exit(status);
    }
    Ok(())
}
