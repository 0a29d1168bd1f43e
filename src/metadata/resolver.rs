//! Two-tier metadata resolution.
//!
//! Per request: validate the environment tag, split the path, resolve the
//! route, query the dynamic tier, fall back to the static tier. The order
//! is fixed - the dynamic source is authoritative, so a static record must
//! never mask a currently-valid dynamic one, and the two tiers are never
//! queried in parallel.

use crate::{
    log,
    metadata::index::StaticIndex,
    routes::RouteRegistry,
    source::DynamicSource,
};
use serde_json::Value;
use std::sync::Arc;

/// Terminal outcome of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Value),
    NotFound,
    BadRequest(&'static str),
}

/// Split a raw request path into `(subpath, token_id)`.
///
/// The token id is the final `/`-delimited segment; a single-segment path
/// has an empty subpath. Leading and trailing slashes are trimmed before
/// splitting, so `ducks/3/` addresses token `3` rather than an empty token
/// id. Only a fully empty path is malformed.
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(i) => Some((&path[..i], &path[i + 1..])),
        None => Some(("", path)),
    }
}

/// Resolution orchestrator over the shared read-only indexes and a
/// dynamic-source client.
pub struct Resolver<S> {
    routes: Arc<RouteRegistry>,
    index: Arc<StaticIndex>,
    source: S,
}

impl<S: DynamicSource> Resolver<S> {
    pub fn new(routes: Arc<RouteRegistry>, index: Arc<StaticIndex>, source: S) -> Self {
        Self {
            routes,
            index,
            source,
        }
    }

    /// Resolve one request.
    ///
    /// `source_tag` is the raw `x-bc-source` header value; absence defaults
    /// to `prod`. Invalid tags and empty paths fail fast, before any
    /// route, dynamic, or static lookup.
    pub async fn resolve(&self, source_tag: Option<&str>, path: &str) -> Resolution {
        let env = match source_tag {
            None => crate::source::Environment::Prod,
            Some(tag) => match tag.parse() {
                Ok(env) => env,
                Err(_) => return Resolution::BadRequest("invalid x-bc-source header"),
            },
        };

        let Some((subpath, token_id)) = split_path(path) else {
            return Resolution::BadRequest("empty metadata path");
        };

        let Some(route) = self.routes.resolve(subpath) else {
            return Resolution::NotFound;
        };

        match self
            .source
            .token_metadata(env, &route.project, &route.collection, token_id)
            .await
        {
            Ok(Some(record)) => return Resolution::Found(record),
            Ok(None) => {}
            // Availability over error transparency: a degraded dynamic tier
            // reads as a miss and resolution continues to the static tier.
            Err(e) => {
                log!(
                    "dynamic";
                    "{env} source degraded for {}/{}/{token_id}: {e}",
                    route.project, route.collection
                );
            }
        }

        match self
            .index
            .lookup(&route.project, &route.collection, token_id)
        {
            Some(record) => match serde_json::to_value(record) {
                Ok(value) => Resolution::Found(value),
                Err(_) => Resolution::NotFound,
            },
            None => Resolution::NotFound,
        }
    }
}
