//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/pathtree/pathtree.toml`
//! 3. Local config: `<project_dir>/.pathtree.toml`
//! 4. Environment variables: `PATHTREE_*` prefix

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::builder::OrphanPolicy;
use crate::errors::{LoadError, LoadResult};
use crate::util::path::{PathCodec, DEFAULT_SEPARATOR};

/// How `pathtree show` renders an assembled tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Box-drawing tree
    #[default]
    Tree,
    /// One line per node, indented with dashes
    Flat,
    /// Nested JSON document
    Json,
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub separator: Option<char>,
    pub orphans: Option<OrphanPolicy>,
    pub format: Option<OutputFormat>,
}

/// Unified configuration for pathtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Path separator (default: '/')
    pub separator: char,
    /// Handling of candidates whose parent has not been seen yet
    pub orphans: OrphanPolicy,
    /// Default output format for `show`
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            orphans: OrphanPolicy::default(),
            format: OutputFormat::default(),
        }
    }
}

/// Get the XDG config directory for pathtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pathtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("pathtree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".pathtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> LoadResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| LoadError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn codec(&self) -> PathCodec {
        PathCodec::new(self.separator)
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            separator: overlay.separator.unwrap_or(self.separator),
            orphans: overlay.orphans.unwrap_or(self.orphans),
            format: overlay.format.unwrap_or(self.format),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.pathtree.toml`
    pub fn load(project_dir: Option<&Path>) -> LoadResult<Self> {
        let global = global_config_path().filter(|p| p.exists());
        let local = project_dir
            .map(local_config_path)
            .filter(|p| p.exists());
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Layered load from explicit file locations; missing layers are skipped.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> LoadResult<Self> {
        let mut current = Self::default();

        for path in [global, local].into_iter().flatten() {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current)
    }

    /// Apply PATHTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> LoadResult<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("PATHTREE"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("separator") {
            settings.separator = parse_separator(&val)?;
        }
        if let Ok(val) = config.get_string("orphans") {
            settings.orphans = parse_enum(&val, "orphans")?;
        }
        if let Ok(val) = config.get_string("format") {
            settings.format = parse_enum(&val, "format")?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> LoadResult<String> {
        toml::to_string_pretty(self).map_err(|e| LoadError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# pathtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/pathtree/pathtree.toml
#   Local:  <project_dir>/.pathtree.toml
#   Env:    PATHTREE_* environment variables (explicit overrides)

# Path separator used in stored paths
# separator = "/"

# Candidates arriving before their parent: "attach_to_root" or "reject"
# orphans = "attach_to_root"

# Default output of `pathtree show`: "tree", "flat" or "json"
# format = "tree"
"#
        .to_string()
    }
}

fn parse_separator(value: &str) -> LoadResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LoadError::Config {
            message: format!("separator must be a single character, got {:?}", value),
        }),
    }
}

fn parse_enum<E: for<'de> Deserialize<'de>>(value: &str, key: &str) -> LoadResult<E> {
    E::deserialize(serde::de::value::StrDeserializer::<serde::de::value::Error>::new(
        value,
    ))
    .map_err(|e| LoadError::Config {
        message: format!("{}: {}", key, e),
    })
}

fn config_err(e: ConfigError) -> LoadError {
    LoadError::Config {
        message: e.to_string(),
    }
}
