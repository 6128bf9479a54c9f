//! Filter configuration files
//!
//! Filters, levels and the client error flag persist as a TOML or JSON
//! document, chosen by file extension. The default file lives at
//! `~/.logtree/filters.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use logtree_core::{ConfigSnapshot, ConfigUpdate};

/// On-disk document format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON, everything else TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    /// Render the serializable part of a snapshot
    pub fn render(self, snapshot: &ConfigSnapshot) -> Result<String> {
        let text = match self {
            Self::Toml => snapshot.to_toml()?,
            Self::Json => snapshot.to_json_pretty()?,
        };
        Ok(text)
    }

    fn parse(self, text: &str) -> Result<ConfigUpdate> {
        let update = match self {
            Self::Toml => ConfigUpdate::from_toml_str(text)?,
            Self::Json => ConfigUpdate::from_json_str(text)?,
        };
        Ok(update)
    }
}

/// Get the default config file path
pub fn default_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".logtree").join("filters.toml"))
}

/// Load a config file. A missing file is not an error.
pub fn load(path: &Path) -> Result<Option<ConfigUpdate>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let update = ConfigFormat::from_path(path)
        .parse(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(Some(update))
}

/// Write a snapshot to disk, creating the parent directory if needed
pub fn save(path: &Path, snapshot: &ConfigSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = ConfigFormat::from_path(path).render(snapshot)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "config file written");
    Ok(())
}
