pub mod geometry;
pub mod rabbit;
pub mod tracked;

pub use rabbit::Rabbit;
