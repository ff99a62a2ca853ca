//! Configuration management for Syllabus
//!
//! The configuration names the material repos to load (in display order), the
//! nodes each repo excludes, and where the synced material lives on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Environment override for [`Config::material_dir`]
pub const MATERIAL_DIR_ENV: &str = "MATERIAL_DIR";
/// Environment override for [`Config::base_path`]
pub const BASE_PATH_ENV: &str = "BASE_PATH";

/// Node ids to drop from a repo when loading it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excludes {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub courses: Vec<String>,
    #[serde(default)]
    pub sections: Vec<String>,
}

/// One material repo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Key under `material:` in the config file
    #[serde(skip)]
    pub key: String,
    /// Directory name under the material dir, also the repo segment of refs
    pub path: String,
    /// Upstream git URL
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub exclude: Excludes,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one checkout per repo
    #[serde(default = "default_material_dir")]
    pub material_dir: PathBuf,

    /// URL prefix the portal is served under (e.g. `/course`)
    #[serde(default)]
    pub base_path: String,

    /// Repos in display order
    #[serde(skip)]
    pub repos: Vec<RepoConfig>,
}

fn default_material_dir() -> PathBuf {
    PathBuf::from(".material")
}

impl Default for Config {
    fn default() -> Self {
        Self { material_dir: default_material_dir(), base_path: String::new(), repos: Vec::new() }
    }
}

/// On-disk shape. `material` stays a mapping so declared repo order survives.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(flatten)]
    base: Config,
    #[serde(default)]
    material: serde_yaml::Mapping,
}

impl Config {
    /// Load configuration from the default location, or defaults if it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::debug!("No config at {:?}, using defaults", config_path);
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file, applying environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        let mut config = raw.base;

        for (key, value) in raw.material {
            let key = key.as_str().context("Repo keys under `material` must be strings")?.to_string();
            let mut repo: RepoConfig = serde_yaml::from_value(value)
                .with_context(|| format!("Invalid repo entry {key:?}"))?;
            repo.key = key;
            config.repos.push(repo);
        }

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(MATERIAL_DIR_ENV) {
            self.material_dir = PathBuf::from(dir);
        }
        if let Ok(base) = std::env::var(BASE_PATH_ENV) {
            self.base_path = base;
        }
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "syllabus").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    /// Find a repo by its directory name
    pub fn repo(&self, path: &str) -> Option<&RepoConfig> {
        self.repos.iter().find(|r| r.path == path)
    }

    /// Excludes for a repo; unknown repos exclude nothing
    pub fn excludes(&self, repo: &str) -> Excludes {
        self.repo(repo).map(|r| r.exclude.clone()).unwrap_or_default()
    }

    /// Upstream URL for a repo
    pub fn repo_url(&self, repo: &str) -> Option<&str> {
        self.repo(repo).map(|r| r.url.as_str())
    }

    /// Directory containing a repo's checkout
    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.material_dir.join(repo)
    }
}
