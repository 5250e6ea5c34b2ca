//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitedSet`: URLs already claimed by a worker (the dedup authority)
//! - `EngineState`: lifecycle of a crawl engine (idle, running, draining, stopped)

mod engine_state;
mod visited;

pub use engine_state::EngineState;
pub use visited::VisitedSet;
