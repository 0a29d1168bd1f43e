//! Configuration section definitions.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"       # Network interface (127.0.0.1 = localhost only)
//! port = 8402                   # HTTP port number
//!
//! [metadata]
//! routes = "config/routes.json" # subpath -> {project, collection} map
//! base_dir = "metadata"         # static (base-tier) metadata files
//!
//! [dynamic]
//! timeout_ms = 3000             # per-request bound on the gateway call
//!
//! [dynamic.gateways]
//! prod = "https://gateway.example"
//! dev = "http://localhost:7740"
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use crate::source::Environment;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 8402,
        }
    }
}

/// Locations of the bundled metadata inputs, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Route registry file (JSON object: subpath -> {project, collection}).
    pub routes: PathBuf,

    /// Base-tier metadata directory: one subdirectory per project, one
    /// `<collection>.json` file per collection.
    pub base_dir: PathBuf,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            routes: PathBuf::from("config/routes.json"),
            base_dir: PathBuf::from("metadata"),
        }
    }
}

/// Dynamic-tier gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicConfig {
    /// Bound on each gateway round trip, in milliseconds. On expiry the
    /// request degrades to the static tier instead of hanging.
    pub timeout_ms: u64,

    /// Per-environment gateway base URLs. Environments without an entry
    /// serve the static tier only.
    pub gateways: BTreeMap<Environment, String>,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            gateways: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::net::Ipv6Addr;

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(config.serve.port, 8402);
    }

    #[test]
    fn test_serve_config_override() {
        let config = test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080");
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn test_serve_config_interface_variants() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_metadata_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.metadata.routes, PathBuf::from("config/routes.json"));
        assert_eq!(config.metadata.base_dir, PathBuf::from("metadata"));
    }

    #[test]
    fn test_dynamic_config() {
        let config = test_parse_config(
            "[dynamic]\ntimeout_ms = 500\n[dynamic.gateways]\nprod = \"https://gw.example\"",
        );
        assert_eq!(config.dynamic.timeout_ms, 500);
        assert_eq!(
            config.dynamic.gateways[&Environment::Prod],
            "https://gw.example"
        );
        assert!(!config.dynamic.gateways.contains_key(&Environment::Dev));
    }

    #[test]
    fn test_dynamic_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.dynamic.timeout_ms, 3000);
        assert!(config.dynamic.gateways.is_empty());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = test_parse_config("[serve]\nport = 3000");
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    }
}
