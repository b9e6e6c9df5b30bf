/// Configuration management
use crate::error::{Result, UiError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_ARCHIVE_RESELECT_MS: u64 = 500;
const DEFAULT_PAGER_ADVANCE_MS: u64 = 150;
const DEFAULT_HISTORY_LIMIT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Phone layout: one slot visible at a time, switched by the pager
    #[default]
    SinglePane,
    /// Tablet layout: master and detail side by side
    TwoPane,
}

/// UI coordination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub layout: LayoutMode,

    /// Wait after archiving the current conversation before selecting the next one
    pub archive_reselect_delay: Duration,

    /// Wait after selecting a conversation before paging to it (single pane)
    pub pager_advance_delay: Duration,

    /// Visible-page history depth used by back navigation
    pub navigation_history_limit: usize,

    /// Optional engine fixture for the simulator
    pub fixture: Option<PathBuf>,

    /// Optional command script for the simulator (stdin otherwise)
    pub script: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::SinglePane,
            archive_reselect_delay: Duration::from_millis(DEFAULT_ARCHIVE_RESELECT_MS),
            pager_advance_delay: Duration::from_millis(DEFAULT_PAGER_ADVANCE_MS),
            navigation_history_limit: DEFAULT_HISTORY_LIMIT,
            fixture: None,
            script: None,
        }
    }
}

fn parse_ms(flag: &str, value: Option<&String>) -> Result<Duration> {
    let raw = value.ok_or_else(|| UiError::Config(format!("{} requires a value in ms", flag)))?;
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| UiError::Config(format!("{} must be a number of milliseconds", flag)))
}

fn env_ms(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

impl UiConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(UiError::Serialization)
    }

    /// Create config from command line arguments (`args[0]` is the binary)
    pub fn from_args(args: &[String]) -> Result<Self> {
        // A config file is the base; flags after it override.
        let mut config = match args.iter().position(|a| a == "--config") {
            Some(i) => {
                let path = args.get(i + 1).ok_or_else(|| {
                    UiError::Config("--config requires a path argument".to_string())
                })?;
                Self::from_file(Path::new(path))?
            }
            None => Self::default(),
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--two-pane" => {
                    config.layout = LayoutMode::TwoPane;
                    i += 1;
                }
                "--single-pane" => {
                    config.layout = LayoutMode::SinglePane;
                    i += 1;
                }
                "--archive-delay" => {
                    config.archive_reselect_delay = parse_ms("--archive-delay", args.get(i + 1))?;
                    i += 2;
                }
                "--pager-delay" => {
                    config.pager_advance_delay = parse_ms("--pager-delay", args.get(i + 1))?;
                    i += 2;
                }
                "--history" => {
                    let raw = args.get(i + 1).ok_or_else(|| {
                        UiError::Config("--history requires a number".to_string())
                    })?;
                    config.navigation_history_limit = raw.parse::<usize>().map_err(|_| {
                        UiError::Config("--history must be a positive number".to_string())
                    })?;
                    i += 2;
                }
                "--fixture" | "--script" | "--config" => {
                    let value = args.get(i + 1).ok_or_else(|| {
                        UiError::Config(format!("{} requires a path argument", args[i]))
                    })?;
                    match args[i].as_str() {
                        "--fixture" => config.fixture = Some(PathBuf::from(value)),
                        "--script" => config.script = Some(PathBuf::from(value)),
                        _ => {}
                    }
                    i += 2;
                }
                other => {
                    return Err(UiError::Config(format!("Unknown argument: {}", other)));
                }
            }
        }

        // Env overrides (nice for scripts)
        if let Some(delay) = env_ms("NAVSIM_ARCHIVE_DELAY_MS") {
            config.archive_reselect_delay = delay;
        }
        if let Some(delay) = env_ms("NAVSIM_PAGER_DELAY_MS") {
            config.pager_advance_delay = delay;
        }
        if std::env::var("NAVSIM_TWO_PANE").is_ok() {
            config.layout = LayoutMode::TwoPane;
        }

        Ok(config)
    }
}
