use serde::{Deserialize, Serialize};

/// How the background reconciliation behaves, stored in `settings.import_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// No scheduled runs.
    #[default]
    None,
    /// Only already imported shows are refreshed (after the first run).
    Import,
    /// The whole catalog is reconciled on every run.
    Auto,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Import => "import",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid import mode '{0}' (expected none, import or auto)")]
pub struct InvalidImportMode(pub String);

impl std::str::FromStr for ImportMode {
    type Err = InvalidImportMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "import" => Ok(Self::Import),
            "auto" => Ok(Self::Auto),
            _ => Err(InvalidImportMode(s.to_string())),
        }
    }
}

/// Lifecycle state of the polling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerState {
    Stopped,
    /// Timer armed, nothing in flight.
    Idle,
    /// One reconciliation in flight.
    Running,
}

impl PollerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

impl std::fmt::Display for PollerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
