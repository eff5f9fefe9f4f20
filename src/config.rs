//! Configuration system
//!
//! Loads ~/.config/mirrorsync/config.yaml with the external tracker
//! settings, store location, and the default bulk-discovery query. Missing
//! or invalid configuration is an unrecoverable error raised before any
//! per-issue work begins.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default environment variable holding the GitHub token
const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default ProjectV2 single-select field carrying the issue status
const DEFAULT_STATUS_FIELD: &str = "Status";

/// GitHub integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub instance URL (e.g., "https://github.com" or an enterprise host)
    pub url: String,

    /// Organization or user owning the mirrored repository
    pub owner: String,

    /// Repository the tracked issues are mirrored against
    pub repo: String,

    /// Environment variable holding the auth token (default GITHUB_TOKEN)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// ProjectV2 field name carrying the status value (default "Status")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_status_field: Option<String>,
}

impl GitHubConfig {
    /// Name of the environment variable the token is read from
    pub fn token_env_name(&self) -> &str {
        self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }

    /// Name of the project field the status is read from
    pub fn status_field_name(&self) -> &str {
        self.project_status_field
            .as_deref()
            .unwrap_or(DEFAULT_STATUS_FIELD)
    }
}

/// Top-level MirrorSync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSyncConfig {
    /// External tracker settings
    pub github: GitHubConfig,

    /// Override for the SQLite store location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Default query for the bulk discovery sub-pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_query: Option<String>,
}

impl MirrorSyncConfig {
    /// Load configuration from the default path (~/.config/mirrorsync/config.yaml)
    pub fn load_default() -> crate::Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::MirrorSyncError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading MirrorSync configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving MirrorSync configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Default config path (~/.config/mirrorsync/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("mirrorsync");
        path.push("config.yaml");
        path
    }

    /// Check required fields; called at load time and again before a run
    pub fn validate(&self) -> crate::Result<()> {
        if self.github.url.trim().is_empty() {
            return Err(crate::MirrorSyncError::Config(
                "github.url must not be empty".to_string(),
            ));
        }
        if self.github.owner.trim().is_empty() {
            return Err(crate::MirrorSyncError::Config(
                "github.owner must not be empty".to_string(),
            ));
        }
        if self.github.repo.trim().is_empty() {
            return Err(crate::MirrorSyncError::Config(
                "github.repo must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
