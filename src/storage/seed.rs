//! Demo records: one user, the "Helix" project, three environments, four
//! tools and the SalesGPT agent.

use tracing::info;

use super::models::{NewAgent, NewEnvironment, NewProject, NewTool, NewUser};
use super::Storage;
use crate::component::AgentConfig;
use crate::error::Result;

/// Owner of every record the API creates
pub const DEMO_USER_ID: &str = "demo-user";

/// Project holding the demo tools and agent
pub const DEMO_PROJECT_ID: &str = "demo-project";

const DEMO_AGENT_ID: &str = "agent-salesgpt";

const ENVIRONMENTS: [(&str, &str, &str); 3] = [
    ("env-production", "Production", "Live production environment"),
    ("env-staging", "Staging", "Pre-production testing environment"),
    ("env-development", "Development", "Development and testing environment"),
];

const TOOLS: [(&str, &str, &str, &str); 4] = [
    ("tool-outlook", "Outlook", "outlook", "Email Tool"),
    ("tool-calendar", "Calendar", "calendar", "Scheduling Tool"),
    ("tool-salesforce", "SalesForce", "salesforce", "CRM Tool"),
    ("tool-openai", "OpenAI", "openai", "LLM Provider"),
];

/// Insert whichever demo records are missing.
///
/// Each record is checked by id, so a seed that stopped partway is completed
/// on the next call. Returns whether anything was inserted.
pub async fn seed_demo_data(storage: &dyn Storage) -> Result<bool> {
    let mut inserted = 0usize;

    if storage.get_user(DEMO_USER_ID).await?.is_none() {
        storage
            .create_user(NewUser {
                id: Some(DEMO_USER_ID.to_string()),
                username: "demo".to_string(),
                password: "demo123".to_string(),
            })
            .await?;
        inserted += 1;
    }

    if storage.get_project(DEMO_PROJECT_ID).await?.is_none() {
        storage
            .create_project(NewProject {
                id: Some(DEMO_PROJECT_ID.to_string()),
                name: "Helix".to_string(),
                description: Some("AI Agent Platform".to_string()),
                user_id: Some(DEMO_USER_ID.to_string()),
            })
            .await?;
        inserted += 1;
    }

    // lists are ordered by insertion, so insert one at a time
    for (id, name, description) in ENVIRONMENTS {
        if storage.get_environment(id).await?.is_some() {
            continue;
        }
        storage
            .create_environment(NewEnvironment {
                id: Some(id.to_string()),
                name: name.to_string(),
                description: Some(description.to_string()),
                user_id: Some(DEMO_USER_ID.to_string()),
            })
            .await?;
        inserted += 1;
    }

    for (id, name, tool_type, description) in TOOLS {
        if storage.get_tool(id).await?.is_some() {
            continue;
        }
        storage
            .create_tool(NewTool {
                id: Some(id.to_string()),
                name: name.to_string(),
                tool_type: tool_type.to_string(),
                description: Some(description.to_string()),
                is_active: true,
                project_id: Some(DEMO_PROJECT_ID.to_string()),
                ..Default::default()
            })
            .await?;
        inserted += 1;
    }

    if storage.get_agent(DEMO_AGENT_ID).await?.is_none() {
        storage
            .create_agent(NewAgent {
                id: Some(DEMO_AGENT_ID.to_string()),
                name: "SalesGPT".to_string(),
                agent_type: "openai".to_string(),
                description: Some("Intelligent sales agent".to_string()),
                config: AgentConfig {
                    provider: Some("openai".to_string()),
                    model: Some("gpt-4".to_string()),
                    temperature: Some(0.7),
                    max_tokens: Some(2048),
                    tools: vec!["tool-salesforce".to_string(), "tool-calendar".to_string()],
                    system_prompt: None,
                },
                project_id: Some(DEMO_PROJECT_ID.to_string()),
            })
            .await?;
        inserted += 1;
    }

    if inserted == 0 {
        info!("Demo data already present");
    } else {
        info!("Seeded {} demo records", inserted);
    }
    Ok(inserted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let storage = MemoryStorage::new();
        assert!(seed_demo_data(&storage).await.unwrap());
        assert!(!seed_demo_data(&storage).await.unwrap());

        let environments = storage.list_environments_by_user(DEMO_USER_ID).await.unwrap();
        let names: Vec<&str> = environments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Production", "Staging", "Development"]);
        assert_eq!(
            storage.list_tools_by_project(DEMO_PROJECT_ID).await.unwrap().len(),
            4
        );
    }

    #[tokio::test]
    async fn test_seed_completes_partial_data() {
        let storage = MemoryStorage::new();
        storage
            .create_user(NewUser {
                id: Some(DEMO_USER_ID.to_string()),
                username: "demo".to_string(),
                password: "demo123".to_string(),
            })
            .await
            .unwrap();

        assert!(seed_demo_data(&storage).await.unwrap());
        assert!(storage.get_project(DEMO_PROJECT_ID).await.unwrap().is_some());
        assert_eq!(
            storage.list_tools_by_project(DEMO_PROJECT_ID).await.unwrap().len(),
            4
        );
        assert!(storage.get_agent(DEMO_AGENT_ID).await.unwrap().is_some());
        assert!(!seed_demo_data(&storage).await.unwrap());
    }
}
