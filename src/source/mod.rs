//! Dynamic-tier source: the authoritative, chain-backed metadata store.
//!
//! The resolver only depends on the [`DynamicSource`] contract; the
//! reqwest-based [`GatewayClient`] is the production implementation.

mod gateway;

pub use gateway::GatewayClient;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;

/// Deployment environment selected by the `x-bc-source` request header.
///
/// The set is closed; any other header value is rejected before a single
/// lookup happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Dev,
    Test,
    Stage,
}

impl Environment {
    pub const ALL: [Self; 4] = [Self::Prod, Self::Dev, Self::Test, Self::Stage];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Stage => "stage",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header value outside the allowed `{prod, dev, test, stage}` set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid environment tag `{0}`")]
pub struct InvalidEnvironment(pub String);

impl FromStr for Environment {
    type Err = InvalidEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "stage" => Ok(Self::Stage),
            other => Err(InvalidEnvironment(other.to_string())),
        }
    }
}

/// Failures while querying the dynamic tier.
///
/// The resolver collapses all of these into the static-fallback branch;
/// they surface in logs, never to the HTTP caller.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("gateway request timed out after {0:?}")]
    Timeout(Duration),
}

/// Contract the resolver consumes: fetch one token's current on-chain
/// metadata, or an explicit absence signal.
///
/// Implementations own their retry/caching policy; the resolver performs a
/// single call per request.
pub trait DynamicSource {
    fn token_metadata(
        &self,
        env: Environment,
        project: &str,
        collection: &str,
        token_id: &str,
    ) -> impl Future<Output = Result<Option<Value>, SourceError>>;
}
