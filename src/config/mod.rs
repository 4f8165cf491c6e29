//! Settings for the designer service.
//!
//! Settings are read from a YAML file. Every section and field has a default,
//! so an empty file (or no file at all) yields a working in-memory setup.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::canvas::EdgePolicy;
use crate::error::{Error, Result};

/// Settings for Agent Designer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Storage backend settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logger settings
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Simulation and retrain timing
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Canvas editing rules
    #[serde(default)]
    pub canvas: CanvasSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Which storage implementation backs the REST layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps, lost on restart
    #[default]
    Memory,
    /// SQLite database file
    Sqlite,
}

/// Storage backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Backend selection
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the SQLite backend
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Insert the demo user, project, environments, tools and agent on startup
    #[serde(default = "default_true")]
    pub seed_demo: bool,
}

/// Logger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colored output
    #[serde(default = "default_true")]
    pub ansi: bool,
}

/// Timing of the mocked simulation and retrain flows, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Total length of a designer simulation run
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    /// Window in which animation cues may start
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Number of talking-bubble cues per run
    #[serde(default = "default_talking_bubbles")]
    pub talking_bubbles: usize,

    /// Number of processing-gear cues per run
    #[serde(default = "default_processing_gears")]
    pub processing_gears: usize,

    /// Number of edge-highlight cues per run
    #[serde(default = "default_edge_highlights")]
    pub edge_highlights: usize,

    /// Length of a retrain
    #[serde(default = "default_retrain_ms")]
    pub retrain_ms: u64,

    /// Delay between retrain completion and the results modal opening
    #[serde(default = "default_results_reveal_ms")]
    pub results_reveal_ms: u64,

    /// Delay before a REST simulation run is marked completed
    #[serde(default = "default_run_completion_ms")]
    pub run_completion_ms: u64,
}

/// Canvas editing rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// Accept edges whose source and target are the same node
    #[serde(default)]
    pub allow_self_loops: bool,

    /// Accept a second edge between an already connected source/target pair
    #[serde(default = "default_true")]
    pub allow_duplicate_edges: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_database_path(),
            seed_demo: true,
        }
    }
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            window_ms: default_window_ms(),
            talking_bubbles: default_talking_bubbles(),
            processing_gears: default_processing_gears(),
            edge_highlights: default_edge_highlights(),
            retrain_ms: default_retrain_ms(),
            results_reveal_ms: default_results_reveal_ms(),
            run_completion_ms: default_run_completion_ms(),
        }
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            allow_self_loops: false,
            allow_duplicate_edges: true,
        }
    }
}

impl ServerSettings {
    /// Socket address the HTTP server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SimulationSettings {
    /// Total simulation run length
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Retrain length
    pub fn retrain(&self) -> Duration {
        Duration::from_millis(self.retrain_ms)
    }

    /// Results modal reveal delay
    pub fn results_reveal(&self) -> Duration {
        Duration::from_millis(self.results_reveal_ms)
    }

    /// REST simulation run completion delay
    pub fn run_completion(&self) -> Duration {
        Duration::from_millis(self.run_completion_ms)
    }
}

impl CanvasSettings {
    /// Edge policy enforced by the graph store
    pub fn edge_policy(&self) -> EdgePolicy {
        EdgePolicy {
            allow_self_loops: self.allow_self_loops,
            allow_duplicates: self.allow_duplicate_edges,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/agent_designer.db")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_duration_ms() -> u64 {
    5000
}

fn default_window_ms() -> u64 {
    4500
}

fn default_talking_bubbles() -> usize {
    8
}

fn default_processing_gears() -> usize {
    6
}

fn default_edge_highlights() -> usize {
    10
}

fn default_retrain_ms() -> u64 {
    5000
}

fn default_results_reveal_ms() -> u64 {
    500
}

fn default_run_completion_ms() -> u64 {
    3000
}

/// Load settings from a YAML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        Error::Config(format!("Failed to open config file {}: {}", path.display(), e))
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    parse_settings(&contents)
}

/// Parse settings from YAML text
pub fn parse_settings(contents: &str) -> Result<Settings> {
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_str(contents)?;
    Ok(settings)
}

/// Get settings, optionally from a specific file
pub fn get_settings(config_path: Option<&str>) -> Result<Settings> {
    match config_path {
        Some(path) => load_settings(path),
        None => {
            let default_paths = [
                "agent_designer.config.yaml",
                "config/agent_designer.config.yaml",
            ];

            for path in default_paths {
                if Path::new(path).exists() {
                    return load_settings(path);
                }
            }

            Ok(Settings::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(settings.storage.backend, StorageBackend::Memory);
        assert!(settings.storage.seed_demo);
        assert_eq!(settings.simulation.duration(), Duration::from_secs(5));
        assert_eq!(settings.simulation.run_completion(), Duration::from_secs(3));
        assert!(!settings.canvas.allow_self_loops);
        assert!(settings.canvas.allow_duplicate_edges);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
server:
  port: 8080
storage:
  backend: sqlite
  path: /tmp/designer.db
simulation:
  duration_ms: 100
"#;
        let settings = parse_settings(yaml).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.storage.backend, StorageBackend::Sqlite);
        assert_eq!(settings.storage.path, PathBuf::from("/tmp/designer.db"));
        assert_eq!(settings.simulation.duration_ms, 100);
        assert_eq!(settings.simulation.window_ms, 4500);
        assert_eq!(settings.logger.level, "info");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_settings("/nonexistent/agent_designer.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
