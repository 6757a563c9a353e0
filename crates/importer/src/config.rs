//! Configuration types for the import pipeline

use crate::error::{ImportError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default CurseForge download-url lookup endpoint
pub const DEFAULT_LOOKUP_URL: &str =
    "https://addons-ecs.forgesvc.net/api/v2/addon/{project}/file/{file}/download-url";

/// Environment variable overriding [`ImportConfig::lookup_url_template`]
pub const ENV_LOOKUP_URL: &str = "CURSE2MCU_LOOKUP_URL";
/// Environment variable overriding [`ImportConfig::user_agent`]
pub const ENV_USER_AGENT: &str = "CURSE2MCU_USER_AGENT";
/// Environment variable overriding [`ImportConfig::server_id`]
pub const ENV_SERVER_ID: &str = "CURSE2MCU_SERVER_ID";

/// Configuration for an import run
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Lookup endpoint with `{project}` and `{file}` placeholders
    pub lookup_url_template: String,
    pub user_agent: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Directory the transient workspace is created in
    pub workspace_root: PathBuf,
    /// Directory the repackaged overrides archive is left in
    pub artifact_dir: PathBuf,
    /// `id` attribute of the generated Server record
    pub server_id: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            lookup_url_template: DEFAULT_LOOKUP_URL.to_string(),
            user_agent: concat!("curse2mcu/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
            workspace_root: PathBuf::from("."),
            artifact_dir: PathBuf::from("."),
            server_id: "curse2mcu".to_string(),
        }
    }
}

impl ImportConfig {
    /// Build the default config, then apply overrides from the process
    /// environment and a `.env` file if one is present.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok(); // Ignore error if .env not present
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(template) = lookup(ENV_LOOKUP_URL) {
            config.lookup_url_template = template;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            config.user_agent = agent;
        }
        if let Some(id) = lookup(ENV_SERVER_ID) {
            config.server_id = id;
        }
        config
    }

    /// Fill the lookup template for one mod reference
    pub fn lookup_url(&self, project_id: u32, file_id: u32) -> String {
        self.lookup_url_template
            .replace("{project}", &project_id.to_string())
            .replace("{file}", &file_id.to_string())
    }

    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{project}", "{file}"] {
            if !self.lookup_url_template.contains(placeholder) {
                return Err(ImportError::Configuration {
                    field: "lookup_url_template".to_string(),
                    message: format!("'{}' is missing the {} placeholder", self.lookup_url_template, placeholder),
                });
            }
        }
        if self.server_id.trim().is_empty() {
            return Err(ImportError::Configuration {
                field: "server_id".to_string(),
                message: "server id must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Fluent builder for [`ImportConfig`]
#[derive(Debug, Clone, Default)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config, e.g. one read from the environment
    pub fn from_config(config: ImportConfig) -> Self {
        Self { config }
    }

    pub fn lookup_url_template<S: Into<String>>(mut self, template: S) -> Self {
        self.config.lookup_url_template = template.into();
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn workspace_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.config.workspace_root = root.into();
        self
    }

    pub fn artifact_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.artifact_dir = dir.into();
        self
    }

    pub fn server_id<S: Into<String>>(mut self, id: S) -> Self {
        self.config.server_id = id.into();
        self
    }

    pub fn build(self) -> ImportConfig {
        self.config
    }
}
