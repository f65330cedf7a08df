//! Rendering-agnostic core: connector geometry, the flow ledger, net-flow
//! sizing, particle animation and the round-based simulation.

pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod ledger;
pub mod node;
pub mod particles;
pub mod scheduler;
pub mod session;
pub mod simulation;
pub mod sizing;
pub mod snapshot;
pub mod world;

pub use catalog::Catalog;
pub use config::FlowConfig;
pub use error::{FlowError, FlowResult};
pub use geometry::{EdgePath, Point, bezier_point, edge_path};
pub use ledger::{Edge, EdgeKey, FlowLedger, GenerationLimits};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TimerTask};
pub use session::{FlowSession, UserAction};
pub use simulation::{SimulationController, SimulationEvent, SimulationState};
pub use sizing::resolve_radius;
pub use snapshot::{FrameSnapshot, RenderAdapter};
