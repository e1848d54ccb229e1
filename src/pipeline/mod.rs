//! Multi-stage ideation pipeline
//!
//! A run is a fixed sequence of prompt invocations. Each stage is given the
//! raw text of an explicit list of earlier stages and nothing else; the
//! "blinded" topology simply hands some stages a shorter list.

pub mod executor;
pub mod graph;
pub mod orchestrator;
pub mod result;

pub use executor::StageExecutor;
pub use graph::{
    Amplifier2Source, RESERVED_STAGE_NAMES, StageGraph, StageKind, StageSpec, Topology,
};
pub use orchestrator::Pipeline;
pub use result::{IdeationResult, StageOutput};
