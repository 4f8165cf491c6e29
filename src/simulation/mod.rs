//! Mocked simulation support.
//!
//! A simulation is a [`Timeline`] of animation cues played by an
//! [`AnimationScheduler`] onto an [`AnimationBoard`], followed by a canned
//! [`SimulationReport`].

pub mod animation;
pub mod results;
pub mod scheduler;
pub mod timeline;

pub use animation::{AnimationBoard, AnimationFlag, AnimationSnapshot};
pub use results::{
    Improvement, LogKind, RetrainReport, SimulationLog, SimulationReport, SimulationResult,
};
pub use scheduler::AnimationScheduler;
pub use timeline::{Cue, Timeline};
