//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rstree/rstree.toml`
//! 3. Local config: `<dir>/.rstree.toml` (default: current directory)
//! 4. Environment variables: `RSTREE_*` prefix, `__` between section and key
//!
//! CLI flags override all of these and are applied by the caller.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DEFAULT_CHILDREN_KEY, DEFAULT_CURRENT_KEY, DEFAULT_PARENT_KEY};

/// Field names used to read and write hierarchy links.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeyConfig {
    pub parent_key: String,
    pub children_key: String,
    pub current_key: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            parent_key: DEFAULT_PARENT_KEY.into(),
            children_key: DEFAULT_CHILDREN_KEY.into(),
            current_key: DEFAULT_CURRENT_KEY.into(),
        }
    }
}

/// Defaults for `rstree build`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// JSON literal of the root sentinel, e.g. `"0"` or `"null"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Apply children key and enrichment at every depth
    pub forward_to_descendants: bool,
    /// Field set to `true` on leaves and `false` on parents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_flag: Option<String>,
    /// Abort builds deeper than this many levels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

/// Output formatting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Raw key config for intermediate parsing (`None` → not specified, inherit from base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawKeyConfig {
    pub parent_key: Option<String>,
    pub children_key: Option<String>,
    pub current_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawBuildConfig {
    pub root: Option<String>,
    pub forward_to_descendants: Option<bool>,
    pub leaf_flag: Option<String>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub pretty: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub keys: RawKeyConfig,
    pub build: RawBuildConfig,
    pub output: RawOutputConfig,
}

/// Unified configuration for rstree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub keys: KeyConfig,
    pub build: BuildConfig,
    pub output: OutputConfig,
}

/// Template written by `rstree config init`.
pub const CONFIG_TEMPLATE: &str = r#"# rstree configuration

[keys]
parent_key = "parentId"
children_key = "children"
current_key = "id"

[build]
# JSON literal of the root sentinel
# root = "0"
forward_to_descendants = false
# leaf_flag = "isLeaf"
# max_depth = 64

[output]
pretty = true
"#;

/// Get the XDG config directory for rstree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rstree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rstree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".rstree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    parse_raw_settings(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_raw_settings(content: &str) -> Result<RawSettings, toml::de::Error> {
    toml::from_str(content)
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay config onto self: scalar options win if specified.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            keys: KeyConfig {
                parent_key: overlay
                    .keys
                    .parent_key
                    .clone()
                    .unwrap_or_else(|| self.keys.parent_key.clone()),
                children_key: overlay
                    .keys
                    .children_key
                    .clone()
                    .unwrap_or_else(|| self.keys.children_key.clone()),
                current_key: overlay
                    .keys
                    .current_key
                    .clone()
                    .unwrap_or_else(|| self.keys.current_key.clone()),
            },
            build: BuildConfig {
                root: overlay.build.root.clone().or_else(|| self.build.root.clone()),
                forward_to_descendants: overlay
                    .build
                    .forward_to_descendants
                    .unwrap_or(self.build.forward_to_descendants),
                leaf_flag: overlay
                    .build
                    .leaf_flag
                    .clone()
                    .or_else(|| self.build.leaf_flag.clone()),
                max_depth: overlay.build.max_depth.or(self.build.max_depth),
            },
            output: OutputConfig {
                pretty: overlay.output.pretty.unwrap_or(self.output.pretty),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Directory searched for `.rstree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        Self::apply_env_overrides(current)
    }

    /// Apply RSTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("RSTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("keys.parent_key") {
            settings.keys.parent_key = val;
        }
        if let Ok(val) = config.get_string("keys.children_key") {
            settings.keys.children_key = val;
        }
        if let Ok(val) = config.get_string("keys.current_key") {
            settings.keys.current_key = val;
        }
        if let Ok(val) = config.get_string("build.root") {
            settings.build.root = Some(val);
        }
        if let Ok(val) = config.get_bool("build.forward_to_descendants") {
            settings.build.forward_to_descendants = val;
        }
        if let Ok(val) = config.get_string("build.leaf_flag") {
            settings.build.leaf_flag = Some(val);
        }
        if let Ok(val) = config.get_int("build.max_depth") {
            settings.build.max_depth = usize::try_from(val).ok();
        }
        if let Ok(val) = config.get_bool("output.pretty") {
            settings.output.pretty = val;
        }

        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
