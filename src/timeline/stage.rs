//! The fixed three-stage shipment script

/// One step of the roadmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingStage {
    pub status: &'static str,
    pub node_index: usize,
    /// Offset from the start of a run
    pub delay_ms: u32,
    pub message: &'static str,
    pub delivery_estimate: &'static str,
    pub progress_percent: u8,
    /// Progression stalls here; later stages never render
    pub pause_here: bool,
}

/// Number of roadmap nodes
pub const NODE_COUNT: usize = 3;

pub const STAGES: [TrackingStage; NODE_COUNT] = [
    TrackingStage {
        status: "Processed",
        node_index: 0,
        delay_ms: 1000,
        message: "Gold shipment confirmed and processed",
        delivery_estimate: "5-7 business days",
        progress_percent: 33,
        pause_here: false,
    },
    TrackingStage {
        status: "In Transit",
        node_index: 1,
        delay_ms: 3000,
        message: "Gold in secure transit - Tracking active",
        delivery_estimate: "3-5 business days",
        progress_percent: 66,
        pause_here: true,
    },
    TrackingStage {
        status: "Delivered",
        node_index: 2,
        delay_ms: 5000,
        message: "Gold shipment successfully delivered",
        delivery_estimate: "Completed",
        progress_percent: 100,
        pause_here: false,
    },
];

/// Index of the first stage flagged `pause_here`
pub fn pause_index() -> Option<usize> {
    STAGES.iter().position(|s| s.pause_here)
}

/// Whether a stage is past the pause gate and must not render
pub fn is_gated(index: usize) -> bool {
    pause_index().is_some_and(|p| index > p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_strictly_increasing() {
        assert!(STAGES.windows(2).all(|w| w[0].delay_ms < w[1].delay_ms));
    }

    #[test]
    fn test_single_pause_at_in_transit() {
        assert_eq!(STAGES.iter().filter(|s| s.pause_here).count(), 1);
        assert_eq!(pause_index(), Some(1));
        assert_eq!(STAGES[1].status, "In Transit");
    }

    #[test]
    fn test_gate() {
        assert!(!is_gated(0));
        assert!(!is_gated(1));
        assert!(is_gated(2));
    }

    #[test]
    fn test_node_indices_match_position() {
        for (i, stage) in STAGES.iter().enumerate() {
            assert_eq!(stage.node_index, i);
        }
    }
}
