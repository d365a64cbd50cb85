pub mod render;

pub use render::ShapeRenderer;
