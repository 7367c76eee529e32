//! Layered configuration
//!
//! Values are read, lowest precedence first, from built-in defaults, the
//! user config file, `luapack.toml` in the working directory, an explicit
//! config file, and `LUAPACK_*` environment variables. Command-line flags are
//! applied on top by the binary.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use etcetera::BaseStrategy;
use log::debug;
use serde::Deserialize;

/// Name of both the project and the user config file
pub const CONFIG_FILE_NAME: &str = "luapack.toml";

const ENV_SOURCE_DIR: &str = "LUAPACK_SOURCE_DIR";
const ENV_OUTPUT_DIR: &str = "LUAPACK_OUTPUT_DIR";
const ENV_EXTENSION_POINT: &str = "LUAPACK_EXTENSION_POINT";
const ENV_MIXIN_DIR: &str = "LUAPACK_MIXIN_DIR";
const ENV_STRIP_COMMENTS: &str = "LUAPACK_STRIP_COMMENTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory entry scripts and modules are loaded from
    pub source_dir: PathBuf,
    /// Directory bundles are written to
    pub output_dir: PathBuf,
    /// Module that loads the mixins; empty disables mixin injection
    pub extension_point: String,
    /// Directory below `source_dir` scanned for mixin modules
    pub mixin_dir: PathBuf,
    /// Strip comments and blank lines from finished bundles
    pub strip_comments: bool,
    /// Text placed above every entry script (`{script}` is the entry name)
    pub entry_prelude: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("dist"),
            extension_point: "library.mixin".to_owned(),
            mixin_dir: PathBuf::from("mixin"),
            strip_comments: true,
            entry_prelude: None,
        }
    }
}

/// One config file; absent keys leave lower layers alone
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    extension_point: Option<String>,
    mixin_dir: Option<PathBuf>,
    strip_comments: Option<bool>,
    entry_prelude: Option<String>,
}

impl Config {
    /// Load the full configuration stack
    ///
    /// `explicit_path` must exist; the user and project files are optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_path) = user_config_path() {
            config.merge_file_if_exists(&user_path)?;
        }
        config.merge_file_if_exists(Path::new(CONFIG_FILE_NAME))?;
        if let Some(path) = explicit_path {
            config.merge_file(path)?;
        }

        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file into a configuration over the defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge(toml::from_str(contents)?);
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be expressed by their types
    ///
    /// Mixin names are derived from paths below `source_dir`, so `mixin_dir`
    /// must be a relative path that stays inside it.
    pub fn validate(&self) -> Result<()> {
        let inside_source = self
            .mixin_dir
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !inside_source {
            return Err(anyhow!(
                "mixin_dir '{}' must be a relative path inside the source directory",
                self.mixin_dir.display()
            ));
        }
        Ok(())
    }

    fn merge_file_if_exists(&mut self, path: &Path) -> Result<()> {
        if path.is_file() {
            self.merge_file(path)?;
        }
        Ok(())
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        self.merge(file);
        Ok(())
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(source_dir) = file.source_dir {
            self.source_dir = source_dir;
        }
        if let Some(output_dir) = file.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(extension_point) = file.extension_point {
            self.extension_point = extension_point;
        }
        if let Some(mixin_dir) = file.mixin_dir {
            self.mixin_dir = mixin_dir;
        }
        if let Some(strip_comments) = file.strip_comments {
            self.strip_comments = strip_comments;
        }
        if file.entry_prelude.is_some() {
            self.entry_prelude = file.entry_prelude;
        }
    }

    /// Apply `LUAPACK_*` overrides read through `lookup`
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_SOURCE_DIR) {
            self.source_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_EXTENSION_POINT) {
            self.extension_point = value;
        }
        if let Some(value) = lookup(ENV_MIXIN_DIR) {
            self.mixin_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_STRIP_COMMENTS) {
            self.strip_comments = parse_bool(&value)
                .ok_or_else(|| anyhow!("Invalid boolean in {ENV_STRIP_COMMENTS}: '{value}'"))?;
        }
        Ok(())
    }

    /// The extension point, or `None` when injection is disabled
    pub fn extension_point(&self) -> Option<&str> {
        let name = self.extension_point.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Location of the mixin directory below the source directory
    pub fn mixin_root(&self) -> PathBuf {
        self.source_dir.join(&self.mixin_dir)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `<config dir>/luapack/luapack.toml` for the current user
pub fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("luapack").join(CONFIG_FILE_NAME))
}
