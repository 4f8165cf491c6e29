//! Designer UI flags and the events published on change.

use serde::Serialize;

use crate::component::NodeKind;
use crate::simulation::{RetrainReport, SimulationReport};

/// Sidebar tab shown on start
pub const DEFAULT_TAB: &str = "actors";

/// Sidebar sections expanded on start
pub const DEFAULT_EXPANDED_SECTIONS: [&str; 2] = ["environments", "agents"];

/// UI state that is not part of any canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// Sidebar tab
    pub active_tab: String,
    /// Expanded sidebar sections, in expansion order
    pub expanded_sections: Vec<String>,

    /// A simulation is playing
    pub is_simulation_running: bool,
    /// Simulation results modal is open
    pub show_simulation_modal: bool,
    /// Latest simulation outcome
    pub simulation_results: Option<SimulationReport>,

    /// Add-component modal is open
    pub show_add_component_modal: bool,
    /// Kind preselected in the add-component modal
    pub add_component_type: Option<NodeKind>,

    /// A retrain is in progress
    pub is_retrain_running: bool,
    /// Agent being retrained
    pub retrain_agent_id: Option<String>,

    /// Retrain results modal is open
    pub show_results_modal: bool,
    /// Latest retrain outcome
    pub results_data: Option<RetrainReport>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_tab: DEFAULT_TAB.to_string(),
            expanded_sections: DEFAULT_EXPANDED_SECTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            is_simulation_running: false,
            show_simulation_modal: false,
            simulation_results: None,
            show_add_component_modal: false,
            add_component_type: None,
            is_retrain_running: false,
            retrain_agent_id: None,
            show_results_modal: false,
            results_data: None,
        }
    }
}

impl UiState {
    /// Expand a collapsed section or collapse an expanded one.
    /// Returns whether the section is now expanded.
    pub fn toggle_section(&mut self, section: &str) -> bool {
        if let Some(index) = self.expanded_sections.iter().position(|s| s == section) {
            self.expanded_sections.remove(index);
            false
        } else {
            self.expanded_sections.push(section.to_string());
            true
        }
    }

    /// Whether a section is expanded
    pub fn is_expanded(&self, section: &str) -> bool {
        self.expanded_sections.iter().any(|s| s == section)
    }
}

/// Change notifications published by [`super::Designer`]
#[derive(Debug, Clone, PartialEq)]
pub enum DesignerEvent {
    /// Current environment switched
    EnvironmentChanged(String),
    /// Node added
    NodeAdded(String),
    /// Node data patched
    NodeUpdated(String),
    /// Node deleted with the ids of its incident edges
    NodeDeleted {
        /// Node id
        id: String,
        /// Removed edge ids
        edges: Vec<String>,
    },
    /// Edge added by a connection
    EdgeAdded(String),
    /// Node list replaced or patched
    NodesChanged,
    /// Edge list replaced or patched
    EdgesChanged,
    /// Selection changed
    SelectionChanged(Option<String>),
    /// UI flags changed
    UiChanged,
    /// Simulation started
    SimulationStarted,
    /// Simulation finished
    SimulationCompleted(SimulationReport),
    /// Simulation cancelled or superseded
    SimulationCancelled,
    /// Retrain started for an agent
    RetrainStarted(String),
    /// Retrain finished
    RetrainCompleted(RetrainReport),
    /// Retrain results modal opened
    ResultsRevealed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ui = UiState::default();
        assert_eq!(ui.active_tab, "actors");
        assert!(ui.is_expanded("environments"));
        assert!(ui.is_expanded("agents"));
        assert!(!ui.is_simulation_running);
    }

    #[test]
    fn test_toggle_section() {
        let mut ui = UiState::default();
        assert!(!ui.toggle_section("agents"));
        assert!(!ui.is_expanded("agents"));
        assert!(ui.toggle_section("tools"));
        assert_eq!(ui.expanded_sections, vec!["environments", "tools"]);
    }
}
