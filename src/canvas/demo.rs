//! Demo canvas shown in the first environment of a session.

use super::models::{Canvas, NodeData, Position, WorkflowEdge, WorkflowNode};
use crate::component::{ActorType, NodeKind};

fn actor(
    id: &str,
    name: &str,
    description: &str,
    actor_type: ActorType,
    icon: &str,
    color: &str,
    x: f64,
    y: f64,
) -> WorkflowNode {
    let data = NodeData {
        name: name.to_string(),
        description: Some(description.to_string()),
        actor_type: Some(actor_type),
        icon: Some(icon.to_string()),
        color: Some(color.to_string()),
        ..Default::default()
    };
    WorkflowNode::new(id, NodeKind::Actor, Position::new(x, y), data)
}

fn tool(id: &str, name: &str, description: &str, icon: &str, color: &str, x: f64, y: f64) -> WorkflowNode {
    let data = NodeData {
        name: name.to_string(),
        description: Some(description.to_string()),
        tool_type: Some(id.to_string()),
        icon: Some(icon.to_string()),
        color: Some(color.to_string()),
        ..Default::default()
    };
    WorkflowNode::new(id, NodeKind::Tool, Position::new(x, y), data)
}

/// The sales-pipeline demo: 9 nodes, 8 edges
pub fn demo_canvas() -> Canvas {
    let mut orchestrator = actor(
        "orchestrator",
        "Orchestrator",
        "System",
        ActorType::System,
        "cogs",
        "gray",
        680.0,
        320.0,
    );
    orchestrator.kind = NodeKind::Orchestrator;

    let nodes = vec![
        actor("customer", "Customer", "Human Actor", ActorType::Human, "user", "blue", 280.0, 160.0),
        actor("sales-agent", "Sales Agent", "AI Actor", ActorType::Agent, "robot", "gray", 520.0, 220.0),
        orchestrator,
        tool("outlook", "Outlook", "Email Tool", "envelope", "blue", 680.0, 80.0),
        tool("calendar", "Calendar", "Scheduling Tool", "calendar", "green", 880.0, 130.0),
        tool("salesforce", "SalesForce", "CRM Tool", "cloud", "green", 480.0, 350.0),
        tool("openai", "OpenAI", "LLM Provider", "brain", "gray", 260.0, 320.0),
        actor("sales-team", "Sales Team", "Human Group", ActorType::Human, "users", "blue", 920.0, 350.0),
        actor(
            "sales-manager",
            "Sales Manager",
            "Human Supervisor",
            ActorType::Human,
            "user-tie",
            "blue",
            860.0,
            430.0,
        ),
    ];

    let edges = [
        ("e1", "customer", "sales-agent"),
        ("e2", "sales-agent", "orchestrator"),
        ("e3", "orchestrator", "sales-manager"),
        ("e4", "orchestrator", "sales-team"),
        ("e5", "outlook", "sales-agent"),
        ("e6", "calendar", "sales-agent"),
        ("e7", "salesforce", "orchestrator"),
        ("e8", "openai", "sales-agent"),
    ]
    .into_iter()
    .map(|(id, source, target)| WorkflowEdge::new(id, source, target))
    .collect();

    Canvas { nodes, edges }
}
