//! wgpu rendering for a y-down 2D world: one textured-quad pipeline, a
//! camera uniform, and RGBA textures (the sprite sheet and a white texel for
//! solid fills).

pub mod camera;
pub mod gpu_context;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::GpuContext;
pub use sprite_pipeline::SpritePipeline;
pub use texture::Texture;
pub use vertex::SpriteVertex;
