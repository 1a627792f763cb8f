pub mod backend;
pub mod fonts;
pub mod gpu_context;
pub mod texture;

pub use backend::WgpuBackend;
pub use fonts::FontSource;
pub use gpu_context::GpuContext;
