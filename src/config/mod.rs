//! Service configuration management for `tokenmeta.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section    # [serve], [metadata], [dynamic] definitions
//! ├── error      # ConfigError
//! ├── handle     # Global config handle (arc-swap)
//! └── mod.rs     # ServiceConfig (this file)
//! ```

mod error;
mod handle;
mod section;

pub use error::ConfigError;
pub use handle::{cfg, init_config};
pub use section::{DynamicConfig, MetadataConfig, ServeConfig};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing tokenmeta.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Metadata input locations
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Dynamic-tier gateway settings
    #[serde(default)]
    pub dynamic: DynamicConfig,
}

impl ServiceConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file; a missing file
    /// falls back to defaults with cwd as the project root, so the offline
    /// tools work without a config. The serve command validates its inputs
    /// in `validate()` regardless.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let (config_path, exists) = Self::resolve_config_path(cli);

        let mut config = if exists {
            Self::from_path(&config_path)?
        } else {
            log!("config"; "no {} found, using defaults", cli.config.display());
            Self::default()
        };

        config.config_path = config_path;
        config.cli = Some(cli);
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Resolve the config file path by searching upward from cwd.
    fn resolve_config_path(cli: &Cli) -> (PathBuf, bool) {
        let cwd = std::env::current_dir().unwrap_or_default();
        match find_config_file(&cli.config) {
            Some(path) => (path, true),
            None => (cwd.join(&cli.config), false),
        }
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring:", path.display());
            for field in &ignored {
                eprintln!("- {field}");
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Finalize configuration after loading: resolve the root, normalize
    /// metadata paths against it, and apply CLI overrides.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = root;

        self.metadata.routes = self.root_join(&self.metadata.routes);
        self.metadata.base_dir = self.root_join(&self.metadata.base_dir);

        crate::logger::set_verbose(cli.verbose);

        if let Commands::Serve { interface, port } = &cli.command {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
        }
    }

    /// Validate configuration for the current command.
    ///
    /// The serve command must not start without its route registry; a
    /// missing base directory is allowed (dynamic-only service).
    fn validate(&self) -> Result<()> {
        let cli = self.get_cli();
        if cli.is_serve() && !self.metadata.routes.is_file() {
            return Err(ConfigError::Validation(format!(
                "route registry `{}` not found",
                self.metadata.routes.display()
            ))
            .into());
        }
        Ok(())
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    ///
    /// Absolute paths are kept as given.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Get CLI arguments reference
    pub const fn get_cli(&self) -> &'static Cli {
        self.cli.unwrap()
    }
}

/// Search for the config file upward from the current directory.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.is_file().then(|| name.to_path_buf());
    }
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ServiceConfig {
    let (parsed, ignored) = ServiceConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invalid_toml() {
        let result = ServiceConfig::parse_with_ignored("[serve\nport = 8402");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 9000\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ServiceConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 9000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let (_, ignored) =
            ServiceConfig::parse_with_ignored("[metadata]\nbase_dir = \"data\"").unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_root_join() {
        let mut config = ServiceConfig::default();
        config.root = PathBuf::from("/srv/tokenmeta");
        assert_eq!(
            config.root_join("metadata"),
            PathBuf::from("/srv/tokenmeta/metadata")
        );
        assert_eq!(config.root_join("/abs/metadata"), PathBuf::from("/abs/metadata"));
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.cli.is_none());
        assert_eq!(config.serve.port, 8402);
        assert_eq!(config.metadata.base_dir, PathBuf::from("metadata"));
        assert!(config.dynamic.gateways.is_empty());
    }
}
