//! Concrete components
//!
//! Window, camera and rendering building blocks. Each talks to the outside
//! world only through the backends handed to it in its lifecycle context.

pub mod camera;
pub mod render;
pub mod shader;
pub mod sprite;
pub mod texture;
pub mod window;

pub use camera::CameraComponent;
pub use render::RenderComponent;
pub use shader::ShaderComponent;
pub use sprite::SpriteComponent;
pub use texture::TextureComponent;
pub use window::WindowComponent;
