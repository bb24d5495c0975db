//! The reconstruction pipeline, stage by stage: profiling, reliability
//! filtering, overlap graph, contig extraction, merging, and adaptive
//! extension, sequenced by the orchestrator.

pub mod contig;
pub mod extender;
pub mod merger;
pub mod orchestrator;
pub mod overlap_graph;
pub mod profiler;
pub mod reliability;

pub use contig::Contig;
pub use orchestrator::{reconstruct, ReconstructOptions, ReconstructionOutcome};
pub use overlap_graph::OverlapGraph;
pub use profiler::{Mode, ModeParams, Profile};
pub use reliability::ReliableSet;
