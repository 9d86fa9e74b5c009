//! Quiz sessions and the per-turn aggregator.

pub mod aggregator;
pub mod state;

pub use aggregator::{CallPolicy, SessionAggregator};
pub use state::{Session, SurfacedReaction};
