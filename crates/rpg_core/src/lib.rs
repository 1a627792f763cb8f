pub mod error;
pub mod geometry;
pub mod input;
pub mod json;
pub mod render;
pub mod render_mode;
pub mod renderable;
pub mod tags;
pub mod time;

pub use error::{EngineError, EngineResult};
pub use geometry::{Color, Rect};
pub use render::{Backend, FontHandle, Renderer, ResourceProvider, TextTexture, TextureHandle};
pub use renderable::RenderState;
pub use tags::TagSet;
