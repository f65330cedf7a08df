mod component;
mod render;
mod scheduler;
mod state;
mod types;

pub use component::FlowCanvas;
pub use types::FlowStatus;
