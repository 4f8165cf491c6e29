//! Transient visual flags shown while a simulation or retrain runs.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One visual flag on a node or edge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnimationFlag {
    /// Speech bubble on an actor node
    TalkingBubble(String),
    /// Spinning gear on a tool node
    ProcessingGear(String),
    /// Highlighted edge
    HighlightedEdge(String),
    /// Gear on an agent being retrained
    RetrainGear(String),
}

impl AnimationFlag {
    /// Node or edge id the flag is attached to
    pub fn target(&self) -> &str {
        match self {
            AnimationFlag::TalkingBubble(id)
            | AnimationFlag::ProcessingGear(id)
            | AnimationFlag::HighlightedEdge(id)
            | AnimationFlag::RetrainGear(id) => id,
        }
    }
}

#[derive(Debug, Default)]
struct AnimationState {
    talking_bubbles: HashSet<String>,
    processing_gears: HashSet<String>,
    highlighted_edges: HashSet<String>,
    retrain_gears: HashSet<String>,
    generation: u64,
}

impl AnimationState {
    fn set_for(&mut self, flag: &AnimationFlag) -> &mut HashSet<String> {
        match flag {
            AnimationFlag::TalkingBubble(_) => &mut self.talking_bubbles,
            AnimationFlag::ProcessingGear(_) => &mut self.processing_gears,
            AnimationFlag::HighlightedEdge(_) => &mut self.highlighted_edges,
            AnimationFlag::RetrainGear(_) => &mut self.retrain_gears,
        }
    }

    fn clear_simulation(&mut self) {
        self.talking_bubbles.clear();
        self.processing_gears.clear();
        self.highlighted_edges.clear();
    }
}

/// Point-in-time copy of the flags, ids sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSnapshot {
    /// Actor nodes showing a speech bubble
    pub talking_bubbles: Vec<String>,
    /// Tool nodes showing a gear
    pub processing_gears: Vec<String>,
    /// Highlighted edges
    pub highlighted_edges: Vec<String>,
    /// Agents being retrained
    pub retrain_gears: Vec<String>,
    /// Generation of the latest simulation run
    pub generation: u64,
}

impl AnimationSnapshot {
    /// Whether no flag is set
    pub fn is_idle(&self) -> bool {
        self.talking_bubbles.is_empty()
            && self.processing_gears.is_empty()
            && self.highlighted_edges.is_empty()
            && self.retrain_gears.is_empty()
    }
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut ids: Vec<String> = set.iter().cloned().collect();
    ids.sort();
    ids
}

/// Shared flag board.
///
/// Simulation flags carry the generation of the run that set them; a write
/// tagged with an older generation is ignored. Retrain gears are not tied to
/// simulation runs.
#[derive(Debug, Clone, Default)]
pub struct AnimationBoard {
    state: Arc<Mutex<AnimationState>>,
}

impl AnimationBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear simulation flags and start a new generation
    pub async fn begin_generation(&self) -> u64 {
        let mut state = self.state.lock().await;
        state.clear_simulation();
        state.generation += 1;
        state.generation
    }

    /// Current generation
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Set or clear a simulation flag on behalf of run `generation`.
    ///
    /// Returns false, without touching the board, if the generation is stale.
    pub async fn set(&self, generation: u64, flag: &AnimationFlag, on: bool) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return false;
        }

        let target = flag.target().to_string();
        let set = state.set_for(flag);
        if on {
            set.insert(target);
        } else {
            set.remove(&target);
        }
        true
    }

    /// Clear simulation flags if `generation` is still current
    pub async fn clear_simulation(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.clear_simulation();
        }
    }

    /// Set or clear the retrain gear of an agent
    pub async fn set_retrain_gear(&self, agent_id: &str, on: bool) {
        let mut state = self.state.lock().await;
        if on {
            state.retrain_gears.insert(agent_id.to_string());
        } else {
            state.retrain_gears.remove(agent_id);
        }
    }

    /// Whether a flag is currently set
    pub async fn is_set(&self, flag: &AnimationFlag) -> bool {
        let mut state = self.state.lock().await;
        state.set_for(flag).contains(flag.target())
    }

    /// Copy of the board
    pub async fn snapshot(&self) -> AnimationSnapshot {
        let state = self.state.lock().await;
        AnimationSnapshot {
            talking_bubbles: sorted(&state.talking_bubbles),
            processing_gears: sorted(&state.processing_gears),
            highlighted_edges: sorted(&state.highlighted_edges),
            retrain_gears: sorted(&state.retrain_gears),
            generation: state.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stale_generation_is_ignored() {
        let board = AnimationBoard::new();
        let first = board.begin_generation().await;
        let flag = AnimationFlag::TalkingBubble("customer".to_string());

        assert!(board.set(first, &flag, true).await);
        assert!(board.is_set(&flag).await);

        let second = board.begin_generation().await;
        assert!(second > first);
        assert!(!board.is_set(&flag).await);

        assert!(!board.set(first, &flag, true).await);
        assert!(board.snapshot().await.is_idle());
    }

    #[tokio::test]
    async fn test_retrain_gear_survives_new_generation() {
        let board = AnimationBoard::new();
        board.set_retrain_gear("sales-agent", true).await;
        board.begin_generation().await;

        let snapshot = board.snapshot().await;
        assert_eq!(snapshot.retrain_gears, vec!["sales-agent".to_string()]);

        board.set_retrain_gear("sales-agent", false).await;
        assert!(board.snapshot().await.is_idle());
    }
}
