use crate::error::OpenSeaError;
use crate::types::Network;
use async_trait::async_trait;
use config_manager::OpenSeaConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// A single GET against the marketplace API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: Url,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self { url, timeout }
    }

    /// Value of a query parameter, if present
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Issues authenticated GET requests and returns the decoded JSON body
#[async_trait]
pub trait RemoteFetch: Send + Sync {
    async fn fetch_json(&self, request: &ApiRequest) -> Result<serde_json::Value, OpenSeaError>;
}

/// Decode a JSON body into one of the response envelopes
pub(crate) fn decode<T: DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> Result<T, OpenSeaError> {
    serde_json::from_value(value)
        .map_err(|e| OpenSeaError::parse(format!("Failed to parse {} response: {}", what, e)))
}

/// OpenSea v1 REST client
#[derive(Debug, Clone)]
pub struct OpenSeaClient {
    client: Client,
    api_key: String,
    api_host: String,
}

impl OpenSeaClient {
    pub fn new(api_key: String, api_host: String) -> Result<Self, OpenSeaError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            api_key,
            api_host,
        })
    }

    pub fn from_config(config: &OpenSeaConfig) -> Result<Self, OpenSeaError> {
        Self::new(config.api_key.clone(), config.api_host.clone())
    }

    /// `https://{prefix}{host}/api/v1/{path}`
    pub fn endpoint(&self, network: Network, path: &str) -> Result<Url, OpenSeaError> {
        build_endpoint(&self.api_host, network, path)
    }

    /// Log a one-line summary of the configured host; used at startup
    pub fn log_target(&self, network: Network) {
        info!(
            "OpenSea client targeting https://{}{} (network {})",
            network.host_prefix(),
            self.api_host,
            network
        );
    }

    fn masked_key(&self) -> String {
        if self.api_key.len() > 8 {
            let prefix: String = self.api_key.chars().take(4).collect();
            format!("{}...", prefix)
        } else if self.api_key.is_empty() {
            "<none>".to_string()
        } else {
            "****".to_string()
        }
    }
}

pub(crate) fn build_endpoint(api_host: &str, network: Network, path: &str) -> Result<Url, OpenSeaError> {
    let base = format!(
        "https://{}{}/api/v1/{}",
        network.host_prefix(),
        api_host,
        path.trim_start_matches('/')
    );
    Ok(Url::parse(&base)?)
}

#[async_trait]
impl RemoteFetch for OpenSeaClient {
    async fn fetch_json(&self, request: &ApiRequest) -> Result<serde_json::Value, OpenSeaError> {
        debug!("📡 OpenSea request: {} (key {})", request.url, self.masked_key());

        let start_time = std::time::Instant::now();
        let response = self
            .client
            .get(request.url.clone())
            .header("Accept", "application/json")
            .header("X-Api-Key", &self.api_key)
            .timeout(request.timeout)
            .send()
            .await?;

        let status = response.status();
        debug!(
            "📨 Response status {} in {:.2}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("❌ OpenSea API error - Status: {}, Body: {}", status, text);

            return Err(match status.as_u16() {
                401 | 403 => OpenSeaError::AuthError,
                429 => OpenSeaError::RateLimit,
                code => OpenSeaError::ApiError {
                    status: code,
                    message: text,
                },
            });
        }

        let response_text = response.text().await?;
        match serde_json::from_str(&response_text) {
            Ok(value) => Ok(value),
            Err(e) => {
                let sample: String = response_text.chars().take(500).collect();
                error!("❌ Failed to parse OpenSea response: {}", e);
                error!("🔍 Response snippet: {}", sample);
                Err(OpenSeaError::parse(format!(
                    "JSON parse error: {} (response size: {} bytes)",
                    e,
                    response_text.len()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_per_network() {
        let client = OpenSeaClient::new("key".to_string(), "api.opensea.io".to_string()).unwrap();

        assert_eq!(
            client.endpoint(Network::Mainnet, "events").unwrap().as_str(),
            "https://api.opensea.io/api/v1/events"
        );
        assert_eq!(
            client.endpoint(Network::Rinkeby, "/assets").unwrap().as_str(),
            "https://rinkeby-api.opensea.io/api/v1/assets"
        );
    }

    #[test]
    fn test_masked_key_never_shows_full_key() {
        let client =
            OpenSeaClient::new("0123456789abcdef".to_string(), "api.opensea.io".to_string()).unwrap();
        assert_eq!(client.masked_key(), "0123...");

        let client = OpenSeaClient::new(String::new(), "api.opensea.io".to_string()).unwrap();
        assert_eq!(client.masked_key(), "<none>");
    }

    #[test]
    fn test_query_param_lookup() {
        let mut url = Url::parse("https://api.opensea.io/api/v1/events").unwrap();
        url.query_pairs_mut().append_pair("offset", "300");
        let request = ApiRequest::new(url, Duration::from_secs(10));
        assert_eq!(request.query_param("offset").as_deref(), Some("300"));
        assert_eq!(request.query_param("account_address"), None);
    }
}
