//! Application configuration for apidoc.
//!
//! User config lives at `~/.apidoc/apidoc.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApiDocError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "apidoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".apidoc";

// ---------------------------------------------------------------------------
// Config structs (matching apidoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Rendering options.
    #[serde(default)]
    pub render: RenderSection,

    /// Output cleanup filters.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Metadata/doc source pairs to convert.
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory rendered documents are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Heading level used for top-level document titles.
    #[serde(default = "default_heading_level")]
    pub heading_level: u8,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            heading_level: default_heading_level(),
        }
    }
}

fn default_output_dir() -> String {
    "docs/api".into()
}
fn default_heading_level() -> u8 {
    1
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSection {
    /// Language hint attached to `<code>` blocks.
    #[serde(default = "default_code_language")]
    pub code_language: String,

    /// Extension appended to document names in cross-reference links.
    #[serde(default = "default_link_extension")]
    pub link_extension: String,

    /// Absolute URL relative links are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Render members that have no documentation entry.
    #[serde(default = "default_true")]
    pub include_undocumented: bool,

    /// Emit a summary table of members at the top of each type page.
    #[serde(default = "default_true")]
    pub member_tables: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            code_language: default_code_language(),
            link_extension: default_link_extension(),
            base_url: None,
            include_undocumented: true,
            member_tables: true,
        }
    }
}

fn default_code_language() -> String {
    "csharp".into()
}
fn default_link_extension() -> String {
    ".md".into()
}
fn default_true() -> bool {
    true
}

/// `[filters]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Collapse runs of blank lines into one.
    #[serde(default = "default_true")]
    pub collapse_blank_lines: bool,

    /// Strip trailing whitespace from every line.
    #[serde(default = "default_true")]
    pub trim_trailing_whitespace: bool,

    /// Indent code blocks by this many spaces instead of fencing them (0 keeps fences).
    #[serde(default)]
    pub indent_code_blocks: usize,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            collapse_blank_lines: true,
            trim_trailing_whitespace: true,
            indent_code_blocks: 0,
        }
    }
}

/// `[[sources]]` entry: one metadata file and its optional doc file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Path to the metadata JSON produced by the reflection collaborator.
    pub metadata: String,
    /// Path to the XML documentation file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
}

// ---------------------------------------------------------------------------
// Render config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime render configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Heading level of document titles.
    pub heading_level: u8,
    /// Language hint for code blocks.
    pub code_language: String,
    /// Extension appended to link targets.
    pub link_extension: String,
    /// Base URL for absolute links.
    pub base_url: Option<Url>,
    /// Render undocumented members.
    pub include_undocumented: bool,
    /// Emit member summary tables.
    pub member_tables: bool,
    /// Cleanup filter settings.
    pub filters: FiltersConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            heading_level: default_heading_level(),
            code_language: default_code_language(),
            link_extension: default_link_extension(),
            base_url: None,
            include_undocumented: true,
            member_tables: true,
            filters: FiltersConfig::default(),
        }
    }
}

impl TryFrom<&AppConfig> for RenderConfig {
    type Error = ApiDocError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let base_url = config
            .render
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw)
                    .map_err(|e| ApiDocError::config(format!("invalid base_url '{raw}': {e}")))
            })
            .transpose()?;

        let render = Self {
            heading_level: config.defaults.heading_level,
            code_language: config.render.code_language.clone(),
            link_extension: config.render.link_extension.clone(),
            base_url,
            include_undocumented: config.render.include_undocumented,
            member_tables: config.render.member_tables,
            filters: config.filters.clone(),
        };
        render.validate()?;
        Ok(render)
    }
}

impl RenderConfig {
    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.heading_level) {
            return Err(ApiDocError::config(format!(
                "heading_level must be between 1 and 6, got {}",
                self.heading_level
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.apidoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ApiDocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.apidoc/apidoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ApiDocError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ApiDocError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ApiDocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ApiDocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ApiDocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
