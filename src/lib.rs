//! A small interactive 3D scene rendered with wgpu.
//!
//! The crate builds a textured ground plane, an emissive square that bounces
//! along an axis, and a flat shape with a hole, then lets the user orbit the
//! camera around them.  Scene construction, the bounce rule and the orbit
//! controls are plain data and stay testable without a GPU; the renderer and
//! the platform glue (a browser canvas on wasm32, a winit window natively)
//! sit on top.

pub mod app;
pub mod bounce;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;
pub mod texture;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::Viewer;
pub use bounce::{Axis, Oscillator};
pub use camera::{OrbitControls, PerspectiveCamera};
pub use config::{BounceConfig, ConfigError, ViewerConfig};
pub use geometry::MeshData;
pub use input::{InputState, KeyCode, MouseButton};
pub use render::{CameraParams, LightParams, Renderer};
pub use scene::{Light, Material, Scene, SceneObject};
pub use texture::TextureImage;
