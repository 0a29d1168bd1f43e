//! Reqwest client for the chain-indexing gateway.

use super::{DynamicSource, Environment, SourceError};
use crate::config::DynamicConfig;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use tokio::time::timeout;

/// HTTP client for the per-environment metadata gateways.
///
/// Environments without a configured gateway report absence for every
/// token, which leaves the service serving the static tier only.
pub struct GatewayClient {
    client: reqwest::Client,
    gateways: BTreeMap<Environment, String>,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(config: &DynamicConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            gateways: config.gateways.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    fn url(&self, base: &str, project: &str, collection: &str, token_id: &str) -> String {
        format!(
            "{}/token_metadata/{project}/{collection}/{token_id}",
            base.trim_end_matches('/')
        )
    }
}

impl DynamicSource for GatewayClient {
    /// One bounded round trip to the gateway for the selected environment.
    ///
    /// `404` and a JSON `null` body both mean "no record". Timeouts and
    /// transport failures are errors; the resolver decides what they mean.
    async fn token_metadata(
        &self,
        env: Environment,
        project: &str,
        collection: &str,
        token_id: &str,
    ) -> Result<Option<Value>, SourceError> {
        let Some(base) = self.gateways.get(&env) else {
            return Ok(None);
        };
        let url = self.url(base, project, collection, token_id);

        let response = timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))??;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: Value = timeout(self.timeout, response.json())
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))??;

        Ok(if body.is_null() { None } else { Some(body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DynamicConfig;

    fn client(gateways: &[(Environment, &str)]) -> GatewayClient {
        let config = DynamicConfig {
            timeout_ms: 50,
            gateways: gateways
                .iter()
                .map(|(env, url)| (*env, url.to_string()))
                .collect(),
        };
        GatewayClient::new(&config).unwrap()
    }

    #[test]
    fn test_url_shape() {
        let client = client(&[(Environment::Prod, "https://gw.example/")]);
        assert_eq!(
            client.url("https://gw.example/", "MegaYours", "Equipment", "3"),
            "https://gw.example/token_metadata/MegaYours/Equipment/3"
        );
    }

    #[tokio::test]
    async fn test_hung_gateway_times_out() {
        // A listener that accepts the connection but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_millis(300));
            drop(stream);
        });

        let base = format!("http://{addr}");
        let client = client(&[(Environment::Prod, base.as_str())]);
        let err = client
            .token_metadata(Environment::Prod, "MegaYours", "Equipment", "3")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Timeout(d) if d == Duration::from_millis(50)));
        hold.join().unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured_environment_is_absence() {
        let client = client(&[(Environment::Prod, "https://gw.example")]);
        let result = client
            .token_metadata(Environment::Dev, "MegaYours", "Equipment", "3")
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
