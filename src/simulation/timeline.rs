//! Planned animation cues for one simulation run.

use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

use super::animation::AnimationFlag;
use crate::canvas::{WorkflowEdge, WorkflowNode};
use crate::component::NodeKind;
use crate::config::SimulationSettings;

/// How long a talking bubble stays up, in milliseconds
pub const TALKING_BUBBLE_HOLD_MS: RangeInclusive<u64> = 1000..=2000;

/// How long a processing gear spins, in milliseconds
pub const PROCESSING_GEAR_HOLD_MS: RangeInclusive<u64> = 1500..=2500;

/// How long an edge stays highlighted, in milliseconds
pub const EDGE_HIGHLIGHT_HOLD_MS: RangeInclusive<u64> = 800..=1500;

/// A flag raised at `at` and lowered `hold` later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Offset from the start of the run
    pub at: Duration,
    /// Time the flag stays set
    pub hold: Duration,
    /// The flag
    pub flag: AnimationFlag,
}

/// Ordered set of cues
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    cues: Vec<Cue>,
}

impl Timeline {
    /// Timeline from explicit cues
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by_key(|cue| cue.at);
        Self { cues }
    }

    /// Plan a random timeline over a graph.
    ///
    /// Bubbles go on actor nodes, gears on tool nodes, highlights on edges.
    /// A category with nothing to target yields no cues.
    pub fn random<R: Rng + ?Sized>(
        nodes: &[WorkflowNode],
        edges: &[WorkflowEdge],
        settings: &SimulationSettings,
        rng: &mut R,
    ) -> Self {
        let actors: Vec<&str> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Actor)
            .map(|n| n.id.as_str())
            .collect();
        let tools: Vec<&str> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Tool)
            .map(|n| n.id.as_str())
            .collect();
        let edge_ids: Vec<&str> = edges.iter().map(|e| e.id.as_str()).collect();

        let mut cues = Vec::new();
        plan(
            &mut cues,
            &actors,
            settings.talking_bubbles,
            settings.window_ms,
            TALKING_BUBBLE_HOLD_MS,
            AnimationFlag::TalkingBubble,
            rng,
        );
        plan(
            &mut cues,
            &tools,
            settings.processing_gears,
            settings.window_ms,
            PROCESSING_GEAR_HOLD_MS,
            AnimationFlag::ProcessingGear,
            rng,
        );
        plan(
            &mut cues,
            &edge_ids,
            settings.edge_highlights,
            settings.window_ms,
            EDGE_HIGHLIGHT_HOLD_MS,
            AnimationFlag::HighlightedEdge,
            rng,
        );

        Self::new(cues)
    }

    /// Cues ordered by start offset
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the timeline has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub(crate) fn into_cues(self) -> Vec<Cue> {
        self.cues
    }
}

fn plan<R: Rng + ?Sized>(
    cues: &mut Vec<Cue>,
    targets: &[&str],
    count: usize,
    window_ms: u64,
    hold_ms: RangeInclusive<u64>,
    flag: fn(String) -> AnimationFlag,
    rng: &mut R,
) {
    for _ in 0..count {
        let Some(target) = targets.choose(rng) else {
            return;
        };
        let at = if window_ms == 0 {
            0
        } else {
            rng.gen_range(0..window_ms)
        };
        cues.push(Cue {
            at: Duration::from_millis(at),
            hold: Duration::from_millis(rng.gen_range(hold_ms.clone())),
            flag: flag(target.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::demo_canvas;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_demo_timeline_counts_and_bounds() {
        let canvas = demo_canvas();
        let settings = SimulationSettings::default();
        let mut rng = StdRng::seed_from_u64(7);
        let timeline = Timeline::random(&canvas.nodes, &canvas.edges, &settings, &mut rng);

        assert_eq!(timeline.len(), 8 + 6 + 10);
        for cue in timeline.cues() {
            assert!(cue.at < Duration::from_millis(4500));
            match &cue.flag {
                AnimationFlag::TalkingBubble(id) => {
                    assert_eq!(canvas.node(id).unwrap().kind, NodeKind::Actor);
                    assert!(TALKING_BUBBLE_HOLD_MS.contains(&(cue.hold.as_millis() as u64)));
                }
                AnimationFlag::ProcessingGear(id) => {
                    assert_eq!(canvas.node(id).unwrap().kind, NodeKind::Tool);
                    assert!(PROCESSING_GEAR_HOLD_MS.contains(&(cue.hold.as_millis() as u64)));
                }
                AnimationFlag::HighlightedEdge(id) => {
                    assert!(canvas.contains_edge(id));
                    assert!(EDGE_HIGHLIGHT_HOLD_MS.contains(&(cue.hold.as_millis() as u64)));
                }
                AnimationFlag::RetrainGear(_) => panic!("unexpected retrain cue"),
            }
        }
        assert!(timeline.cues().windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_empty_graph_has_no_cues() {
        let mut rng = StdRng::seed_from_u64(1);
        let timeline = Timeline::random(&[], &[], &SimulationSettings::default(), &mut rng);
        assert!(timeline.is_empty());
    }
}
