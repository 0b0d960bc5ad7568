mod basic;
mod runtime;

pub use basic::BasicConfig;
pub use runtime::{LoaderConfig, ProjectConfig, SchedulerConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Package loading (see `loader` table in config.toml).
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Scheduled actions (see `scheduler` table in config.toml).
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Served projects (see `[[projects]]` in config.toml).
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const DEFAULT_PROJECT_NAME: &str = "home";

impl Config {
    /// Builds a Figment that merges defaults, a config TOML file and `PUBLISHER_`-prefixed
    /// environment variables (`PUBLISHER_BASIC__LISTEN_PORT=8080`).
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed("PUBLISHER_").split("__"))
    }

    /// Loads configuration by merging defaults, `config.toml` if present, and the environment.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Projects to serve, with paths resolved against `basic.server_root`.
    ///
    /// With no `[[projects]]` configured, the server root itself is served as one project.
    pub fn resolved_projects(&self) -> Vec<ProjectConfig> {
        if self.projects.is_empty() {
            return vec![ProjectConfig {
                name: DEFAULT_PROJECT_NAME.to_string(),
                path: self.basic.server_root.clone(),
            }];
        }

        self.projects
            .iter()
            .map(|project| ProjectConfig {
                name: project.name.clone(),
                path: self.basic.server_root.join(&project.path),
            })
            .collect()
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);
