//! Roadmap sequencer
//!
//! Plays the stage script against its own scheduler. Starting a new run
//! cancels every cue left over from the previous one, so two runs never
//! interleave.

use super::scheduler::{Scheduler, TaskHandle};
use super::stage::{NODE_COUNT, STAGES, is_gated};
use crate::consts::PAUSE_NOTICE_DELAY_MS;

/// Toast text shown once the shipment stalls
pub const PAUSE_NOTICE: &str = "Shipment has been Paused";
/// Status/delivery text shown between `start` and the first stage
pub const STARTING_STATUS: &str = "Starting tracking...";
pub const STARTING_DELIVERY: &str = "Calculating...";

/// Marker on a roadmap node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Idle,
    Active,
    Completed,
}

/// One roadmap node as it should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeMarker {
    pub state: NodeState,
    /// Continuous glow/pulse animation on the node circle
    pub glowing: bool,
}

/// Everything the roadmap renders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisualProgressState {
    pub nodes: [NodeMarker; NODE_COUNT],
    /// 0..=100, non-decreasing within a run
    pub progress_percent: u8,
    pub status_text: String,
    pub delivery_text: String,
}

impl VisualProgressState {
    /// Clear node markers, glow flags, progress and text
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn active_nodes(&self) -> Vec<usize> {
        self.nodes_in(NodeState::Active)
    }

    pub fn completed_nodes(&self) -> Vec<usize> {
        self.nodes_in(NodeState::Completed)
    }

    fn nodes_in(&self, state: NodeState) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.state == state)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Scheduled work inside a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    Stage(usize),
    PauseNotice,
}

/// Something the rest of the page may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent {
    StageActivated(usize),
    /// A stage timer fired past the pause gate and was ignored
    StageGated(usize),
    /// The shipment stalled; show `PAUSE_NOTICE`
    Paused,
}

#[derive(Debug, Clone, Default)]
pub struct TimelineSequencer {
    state: VisualProgressState,
    scheduler: Scheduler<Cue>,
    cues: Vec<TaskHandle>,
    runs: u32,
}

impl TimelineSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &VisualProgressState {
        &self.state
    }

    /// Number of runs started so far
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Cues still waiting to fire for the current run
    pub fn pending_cues(&self) -> usize {
        self.cues
            .iter()
            .filter(|h| self.scheduler.is_pending(**h))
            .count()
    }

    /// Begin a run at `now_ms`, cancelling whatever the previous run left queued
    pub fn start(&mut self, now_ms: f64) {
        let cancelled = self.cancel_pending();
        if cancelled > 0 {
            log::debug!("Restarting timeline, cancelled {} pending cues", cancelled);
        }
        self.scheduler.advance_to(now_ms);

        self.reset();
        self.state.status_text = STARTING_STATUS.to_string();
        self.state.delivery_text = STARTING_DELIVERY.to_string();

        for (index, stage) in STAGES.iter().enumerate() {
            let handle = self
                .scheduler
                .schedule(f64::from(stage.delay_ms), Cue::Stage(index));
            self.cues.push(handle);
        }
        self.runs += 1;
        log::info!("Tracking run {} started", self.runs);
    }

    /// Clear all node markers and glow, and zero the progress
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Cancel every cue of the current run without touching visual state
    pub fn cancel_pending(&mut self) -> usize {
        self.cues
            .drain(..)
            .filter(|h| self.scheduler.cancel(*h))
            .count()
    }

    /// Fire every cue due by `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> Vec<TimelineEvent> {
        let mut events = Vec::new();
        while let Some(fired) = self.scheduler.pop_due(now_ms) {
            self.cues.retain(|h| *h != fired.handle);
            match fired.payload {
                Cue::Stage(index) => events.push(self.fire_stage(index)),
                Cue::PauseNotice => {
                    log::info!("{}", PAUSE_NOTICE);
                    events.push(TimelineEvent::Paused);
                }
            }
        }
        self.scheduler.advance_to(now_ms);
        events
    }

    fn fire_stage(&mut self, index: usize) -> TimelineEvent {
        if is_gated(index) {
            log::debug!("Stage {} ({}) held at pause gate", index, STAGES[index].status);
            return TimelineEvent::StageGated(index);
        }
        let stage = &STAGES[index];

        if index > 0 {
            self.state.nodes[index - 1].state = NodeState::Completed;
        }
        self.state.nodes[stage.node_index].state = NodeState::Active;
        self.state.progress_percent = self.state.progress_percent.max(stage.progress_percent);
        self.state.status_text = stage.message.to_string();
        self.state.delivery_text = stage.delivery_estimate.to_string();
        log::info!(
            "Stage {} -> {} ({}%)",
            index,
            stage.status,
            self.state.progress_percent
        );

        if stage.pause_here {
            self.state.nodes[stage.node_index].glowing = true;
            let handle = self
                .scheduler
                .schedule(PAUSE_NOTICE_DELAY_MS, Cue::PauseNotice);
            self.cues.push(handle);
        }
        TimelineEvent::StageActivated(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_start_resets_and_sets_placeholder() {
        let mut seq = TimelineSequencer::new();
        seq.start(0.0);
        assert_eq!(seq.state().progress_percent, 0);
        assert_eq!(seq.state().status_text, STARTING_STATUS);
        assert_eq!(seq.state().delivery_text, STARTING_DELIVERY);
        assert_eq!(seq.pending_cues(), 3);
    }

    #[test]
    fn test_stage_timing() {
        let mut seq = TimelineSequencer::new();
        seq.start(100.0);

        assert!(seq.advance(1099.0).is_empty());
        assert_eq!(seq.advance(1100.0), vec![TimelineEvent::StageActivated(0)]);
        assert_eq!(seq.state().active_nodes(), vec![0]);
        assert_eq!(seq.state().progress_percent, 33);

        assert_eq!(seq.advance(3100.0), vec![TimelineEvent::StageActivated(1)]);
        assert_eq!(seq.state().completed_nodes(), vec![0]);
        assert_eq!(seq.state().active_nodes(), vec![1]);
        assert!(seq.state().nodes[1].glowing);

        assert!(seq.advance(3899.0).is_empty());
        assert_eq!(seq.advance(3900.0), vec![TimelineEvent::Paused]);
    }

    #[test]
    fn test_delivered_never_renders() {
        let mut seq = TimelineSequencer::new();
        seq.start(0.0);
        let events = seq.advance(60_000.0);
        assert_eq!(
            events,
            vec![
                TimelineEvent::StageActivated(0),
                TimelineEvent::StageActivated(1),
                TimelineEvent::Paused,
                TimelineEvent::StageGated(2),
            ]
        );
        assert_eq!(seq.state().nodes[2].state, NodeState::Idle);
        assert_eq!(seq.state().progress_percent, 66);
        assert_eq!(seq.state().status_text, STAGES[1].message);
        assert_eq!(seq.pending_cues(), 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut seq = TimelineSequencer::new();
        seq.start(0.0);
        seq.advance(4000.0);

        seq.reset();
        let once = seq.state().clone();
        seq.reset();
        assert_eq!(seq.state(), &once);
        assert_eq!(once.progress_percent, 0);
        assert!(once.nodes.iter().all(|n| *n == NodeMarker::default()));
    }

    #[test]
    fn test_restart_cancels_previous_run() {
        let mut seq = TimelineSequencer::new();
        seq.start(0.0);
        seq.advance(1500.0);
        assert_eq!(seq.state().progress_percent, 33);

        // Retrigger before stage 1 of the first run is due
        seq.start(2000.0);
        assert_eq!(seq.state().progress_percent, 0);

        // First run's stage 1 would have fired at 3000; nothing may happen
        assert!(seq.advance(2999.0).is_empty());
        assert_eq!(seq.advance(3000.0), vec![TimelineEvent::StageActivated(0)]);
        assert_eq!(seq.state().progress_percent, 33);
        assert_eq!(seq.runs(), 2);
    }

    proptest! {
        #[test]
        fn progress_is_monotonic_within_a_run(steps in proptest::collection::vec(1.0f64..700.0, 1..60)) {
            let mut seq = TimelineSequencer::new();
            seq.start(0.0);
            let mut now = 0.0;
            let mut last = 0u8;
            for step in steps {
                now += step;
                seq.advance(now);
                let p = seq.state().progress_percent;
                prop_assert!(p >= last);
                prop_assert!(matches!(p, 0 | 33 | 66));
                prop_assert_ne!(seq.state().nodes[2].state, NodeState::Active);
                last = p;
            }
        }
    }
}
