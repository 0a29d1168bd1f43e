//! Route registry: maps a request subpath to the owning collection.
//!
//! Loaded once at startup from `routes.json` and read-only afterwards.
//! A subpath is the routing-key portion of a metadata request path with the
//! trailing token-id segment removed (e.g. a contract address or an alias
//! like `ducks`). Lookup is exact string match only: a miss on `a/b` does
//! NOT fall back to `a`.

use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors raised while loading `routes.json`. Fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("failed to parse `{0}` as a route map")]
    Parse(PathBuf, #[source] serde_json::Error),
}

/// The (project, collection) pair that owns a subpath.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    pub project: String,
    pub collection: String,
}

/// Preloaded subpath -> route mapping.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: BTreeMap<String, RouteConfig>,
}

impl RouteRegistry {
    /// Load the registry from a JSON object mapping subpaths to routes.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content =
            fs::read_to_string(path).map_err(|e| RegistryError::Io(path.to_path_buf(), e))?;
        Self::from_json(&content).map_err(|e| RegistryError::Parse(path.to_path_buf(), e))
    }

    /// Parse a registry from raw JSON.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let routes: BTreeMap<String, RouteConfig> = serde_json::from_str(content)?;
        Ok(Self { routes })
    }

    /// Exact-match lookup. No wildcards, no hierarchical fallback.
    ///
    /// An empty subpath only resolves when the registry carries a deliberate
    /// `""` entry; there is no implicit default route.
    pub fn resolve(&self, subpath: &str) -> Option<&RouteConfig> {
        self.routes.get(subpath)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RouteRegistry {
        RouteRegistry::from_json(
            r#"{
                "ducks": {"project": "MegaYours", "collection": "Equipment"},
                "0xabc/items": {"project": "MegaYours", "collection": "Items"},
                "": {"project": "MegaYours", "collection": "Default"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_exact_match() {
        let registry = registry();
        let route = registry.resolve("ducks").unwrap();
        assert_eq!(route.project, "MegaYours");
        assert_eq!(route.collection, "Equipment");
    }

    #[test]
    fn test_resolve_multi_segment_subpath() {
        let registry = registry();
        let route = registry.resolve("0xabc/items").unwrap();
        assert_eq!(route.collection, "Items");
    }

    #[test]
    fn test_resolve_no_hierarchical_fallback() {
        let registry = registry();
        // "0xabc" alone is not configured; the miss must not fall back to
        // the "0xabc/items" entry (or anything else)
        assert!(registry.resolve("0xabc").is_none());
        assert!(registry.resolve("0xabc/items/extra").is_none());
    }

    #[test]
    fn test_resolve_empty_subpath_is_explicit() {
        let registry = registry();
        assert_eq!(registry.resolve("").unwrap().collection, "Default");

        let without_default =
            RouteRegistry::from_json(r#"{"ducks": {"project": "P", "collection": "C"}}"#).unwrap();
        assert!(without_default.resolve("").is_none());
    }

    #[test]
    fn test_resolve_miss_is_none_not_error() {
        assert!(registry().resolve("not-configured").is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(RouteRegistry::from_json("{\"ducks\": \"oops\"}").is_err());
        assert!(RouteRegistry::from_json("[1, 2]").is_err());
        assert!(RouteRegistry::from_json("{").is_err());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = RouteRegistry::load(Path::new("/nonexistent/routes.json")).unwrap_err();
        assert!(matches!(err, RegistryError::Io(..)));
    }
}
