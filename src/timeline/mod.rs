//! Scripted roadmap timeline
//!
//! - `scheduler`: cancellable one-shot timers on a host-fed clock
//! - `stage`: the fixed stage table
//! - `sequencer`: plays the table into visual progress state

pub mod scheduler;
pub mod sequencer;
pub mod stage;

pub use scheduler::{Fired, Scheduler, TaskHandle};
pub use sequencer::{
    NodeMarker, NodeState, PAUSE_NOTICE, TimelineEvent, TimelineSequencer, VisualProgressState,
};
pub use stage::{NODE_COUNT, STAGES, TrackingStage};
