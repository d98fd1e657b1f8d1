use crate::client::{build_endpoint, decode, ApiRequest, RemoteFetch};
use crate::display::{display_amount, handle_significant_decimals, parse_amount};
use crate::error::OpenSeaError;
use crate::normalizer::AMOUNT_SIGNIFICANT_DECIMALS;
use crate::types::{
    AssetDetailResponse, AssetsResponse, CollectionResponse, Network, PriceKind, UniqueTokenAsset,
};
use config_manager::OpenSeaConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Assets requested per page of an account's collection
pub const UNIQUE_TOKENS_LIMIT_PER_PAGE: usize = 50;

/// Upper bound on the number of assets loaded for one account
pub const UNIQUE_TOKENS_LIMIT_TOTAL: usize = 2000;

const NO_PRICE: &str = "None";

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub api_host: String,
    pub assets_timeout: Duration,
    pub price_timeout: Duration,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            api_host: "api.opensea.io".to_string(),
            assets_timeout: Duration::from_secs(20),
            price_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&OpenSeaConfig> for AssetSettings {
    fn from(config: &OpenSeaConfig) -> Self {
        Self {
            api_host: config.api_host.clone(),
            assets_timeout: Duration::from_secs(config.assets_timeout_seconds),
            price_timeout: Duration::from_secs(config.price_timeout_seconds),
        }
    }
}

/// Account collections and per-asset price lookups
#[derive(Clone)]
pub struct UniqueTokenService {
    fetcher: Arc<dyn RemoteFetch>,
    settings: AssetSettings,
}

impl UniqueTokenService {
    pub fn new(fetcher: Arc<dyn RemoteFetch>, settings: AssetSettings) -> Self {
        Self { fetcher, settings }
    }

    fn request(
        &self,
        network: Network,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<ApiRequest, OpenSeaError> {
        let mut url = build_endpoint(&self.settings.api_host, network, path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(ApiRequest::new(url, timeout))
    }

    /// One page of the assets owned by `owner`; `page` is zero based
    pub async fn fetch_account_unique_tokens(
        &self,
        network: Network,
        owner: &str,
        page: usize,
    ) -> Result<Vec<UniqueTokenAsset>, OpenSeaError> {
        let request = self.request(
            network,
            "assets",
            &[
                ("limit", UNIQUE_TOKENS_LIMIT_PER_PAGE.to_string()),
                ("offset", (page * UNIQUE_TOKENS_LIMIT_PER_PAGE).to_string()),
                ("owner", owner.to_string()),
            ],
            self.settings.assets_timeout,
        )?;

        let result = async {
            let body = self.fetcher.fetch_json(&request).await?;
            let response: AssetsResponse = decode(body, "assets")?;
            Ok::<_, OpenSeaError>(response.assets.unwrap_or_default())
        }
        .await;

        if let Err(ref e) = result {
            warn!("Error getting unique tokens for {}: {}", owner, e);
        }
        result
    }

    /// Every asset owned by `owner`, capped at [`UNIQUE_TOKENS_LIMIT_TOTAL`]
    pub async fn fetch_all_account_unique_tokens(
        &self,
        network: Network,
        owner: &str,
    ) -> Result<Vec<UniqueTokenAsset>, OpenSeaError> {
        let mut all_assets = Vec::new();
        let mut page = 0usize;

        loop {
            let assets = self.fetch_account_unique_tokens(network, owner, page).await?;
            let page_len = assets.len();
            all_assets.extend(assets);

            debug!(
                "📄 Assets page {}: {} assets ({} total)",
                page, page_len, all_assets.len()
            );

            if page_len < UNIQUE_TOKENS_LIMIT_PER_PAGE || all_assets.len() >= UNIQUE_TOKENS_LIMIT_TOTAL {
                break;
            }
            page += 1;
        }

        all_assets.truncate(UNIQUE_TOKENS_LIMIT_TOTAL);
        info!(
            "✅ Loaded {} unique tokens for {} on {}",
            all_assets.len(),
            owner,
            network
        );
        Ok(all_assets)
    }

    /// Last sale or current listing price of the account's newest asset in the
    /// contract named by `url_suffix` (`"{contract}/{token_id}"`).
    /// `"None"` when there is no such price.
    pub async fn fetch_last_sale_or_list_price(
        &self,
        account_address: &str,
        network: Network,
        url_suffix: &str,
        kind: PriceKind,
    ) -> Result<String, OpenSeaError> {
        let contract_address = url_suffix.split('/').next().unwrap_or_default();
        let request = self.request(
            network,
            "assets",
            &[
                ("owner", account_address.to_string()),
                ("asset_contract_address", contract_address.to_string()),
                ("order_direction", "desc".to_string()),
                ("offset", "0".to_string()),
                ("limit", "1".to_string()),
            ],
            self.settings.price_timeout,
        )?;

        let body = self.fetcher.fetch_json(&request).await.map_err(|e| {
            debug!("LIST OR SALE PRICE FETCH ERROR: {}", e);
            e
        })?;
        let response: AssetsResponse = decode(body, "assets")?;
        let asset = response.assets.unwrap_or_default().into_iter().next();

        let (amount, token) = match (kind, asset) {
            (PriceKind::LastSale, Some(asset)) => match asset.last_sale {
                Some(sale) => (
                    sale.total_price,
                    sale.payment_token.and_then(|t| t.symbol),
                ),
                None => (None, None),
            },
            (PriceKind::CurrentListing, Some(asset)) => {
                match asset.sell_orders.and_then(|orders| orders.into_iter().next()) {
                    Some(order) => (
                        order.current_price,
                        order.payment_token_contract.and_then(|t| t.symbol),
                    ),
                    None => (None, None),
                }
            }
            (_, None) => (None, None),
        };

        if amount.is_none() {
            return Ok(NO_PRICE.to_string());
        }

        Ok(display_amount(
            amount.as_deref(),
            token.as_deref(),
            AMOUNT_SIGNIFICANT_DECIMALS,
        ))
    }

    /// Collection floor price for the asset at `url_suffix`, e.g. `"0.042 ETH"`.
    /// `"None"` when the collection has no floor.
    pub async fn fetch_floor_price(
        &self,
        network: Network,
        url_suffix: &str,
    ) -> Result<String, OpenSeaError> {
        let request = self.request(
            network,
            &format!("asset/{}", url_suffix),
            &[],
            self.settings.price_timeout,
        )?;
        debug!("{}", request.url);

        let body = self.fetcher.fetch_json(&request).await.map_err(|e| {
            debug!("TOKEN FETCH ERROR: {}", e);
            e
        })?;
        let asset: AssetDetailResponse = decode(body, "asset")?;

        let Some(slug) = asset.collection.and_then(|c| c.slug) else {
            warn!("Asset {} has no collection slug", url_suffix);
            return Ok(NO_PRICE.to_string());
        };

        let request = self.request(
            network,
            &format!("collection/{}", slug),
            &[],
            self.settings.price_timeout,
        )?;
        debug!("{}", request.url);

        let body = self.fetcher.fetch_json(&request).await.map_err(|e| {
            debug!("TOKEN FETCH ERROR: {}", e);
            e
        })?;
        let collection: CollectionResponse = decode(body, "collection")?;

        let floor = collection
            .collection
            .and_then(|c| c.stats)
            .and_then(|s| s.floor_price)
            .and_then(|raw| parse_amount(&raw));

        let floor_price = match floor {
            Some(value) if !value.is_zero() => format!(
                "{} ETH",
                handle_significant_decimals(value, AMOUNT_SIGNIFICANT_DECIMALS)
            ),
            _ => NO_PRICE.to_string(),
        };

        info!("FLOOR_PRICE: {}", floor_price);
        Ok(floor_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers by URL path and records requests
    struct RoutedFetch {
        routes: Vec<(&'static str, serde_json::Value)>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl RoutedFetch {
        fn new(routes: Vec<(&'static str, serde_json::Value)>) -> Arc<Self> {
            Arc::new(Self {
                routes,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RemoteFetch for RoutedFetch {
        async fn fetch_json(&self, request: &ApiRequest) -> Result<serde_json::Value, OpenSeaError> {
            self.requests.lock().unwrap().push(request.clone());
            self.routes
                .iter()
                .find(|(path, _)| request.url.path().ends_with(path))
                .map(|(_, body)| body.clone())
                .ok_or(OpenSeaError::ApiError {
                    status: 404,
                    message: request.url.path().to_string(),
                })
        }
    }

    fn assets(count: usize) -> serde_json::Value {
        let assets: Vec<_> = (0..count)
            .map(|i| json!({ "token_id": i.to_string(), "asset_contract": { "address": "0xabc" } }))
            .collect();
        json!({ "assets": assets })
    }

    #[tokio::test]
    async fn test_account_page_query() {
        let fetch = RoutedFetch::new(vec![("/assets", assets(3))]);
        let service = UniqueTokenService::new(fetch.clone(), AssetSettings::default());
        let tokens = service
            .fetch_account_unique_tokens(Network::Mainnet, "0xowner", 2)
            .await
            .unwrap();

        assert_eq!(tokens.len(), 3);
        let request = fetch.requests.lock().unwrap()[0].clone();
        assert_eq!(request.query_param("offset").as_deref(), Some("100"));
        assert_eq!(request.query_param("limit").as_deref(), Some("50"));
        assert_eq!(request.query_param("owner").as_deref(), Some("0xowner"));
        assert_eq!(request.timeout, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_all_tokens_capped_at_total_limit() {
        let fetch = RoutedFetch::new(vec![("/assets", assets(UNIQUE_TOKENS_LIMIT_PER_PAGE))]);
        let service = UniqueTokenService::new(fetch.clone(), AssetSettings::default());
        let tokens = service
            .fetch_all_account_unique_tokens(Network::Mainnet, "0xowner")
            .await
            .unwrap();

        assert_eq!(tokens.len(), UNIQUE_TOKENS_LIMIT_TOTAL);
        assert_eq!(
            fetch.requests.lock().unwrap().len(),
            UNIQUE_TOKENS_LIMIT_TOTAL / UNIQUE_TOKENS_LIMIT_PER_PAGE
        );
    }

    #[tokio::test]
    async fn test_last_sale_price() {
        let fetch = RoutedFetch::new(vec![(
            "/assets",
            json!({ "assets": [{
                "last_sale": {
                    "total_price": "2500000000000000000",
                    "payment_token": { "symbol": "ETH" }
                }
            }]}),
        )]);
        let service = UniqueTokenService::new(fetch.clone(), AssetSettings::default());
        let price = service
            .fetch_last_sale_or_list_price("0xowner", Network::Mainnet, "0xabc/1", PriceKind::LastSale)
            .await
            .unwrap();
        assert_eq!(price, "2.50");

        let request = fetch.requests.lock().unwrap()[0].clone();
        assert_eq!(request.query_param("asset_contract_address").as_deref(), Some("0xabc"));
        assert_eq!(request.query_param("order_direction").as_deref(), Some("desc"));
        assert_eq!(request.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_listing_is_none() {
        let fetch = RoutedFetch::new(vec![("/assets", json!({ "assets": [{ "sell_orders": null }] }))]);
        let service = UniqueTokenService::new(fetch, AssetSettings::default());
        let price = service
            .fetch_last_sale_or_list_price(
                "0xowner",
                Network::Mainnet,
                "0xabc/1",
                PriceKind::CurrentListing,
            )
            .await
            .unwrap();
        assert_eq!(price, "None");
    }

    #[tokio::test]
    async fn test_current_listing_price() {
        let fetch = RoutedFetch::new(vec![(
            "/assets",
            json!({ "assets": [{ "sell_orders": [{
                "current_price": "50000000000000000.000000",
                "payment_token_contract": { "symbol": "ETH" }
            }]}]}),
        )]);
        let service = UniqueTokenService::new(fetch, AssetSettings::default());
        let price = service
            .fetch_last_sale_or_list_price(
                "0xowner",
                Network::Mainnet,
                "0xabc/1",
                PriceKind::CurrentListing,
            )
            .await
            .unwrap();
        assert_eq!(price, "0.05");
    }

    #[tokio::test]
    async fn test_floor_price() {
        let fetch = RoutedFetch::new(vec![
            ("/asset/0xabc/1", json!({ "collection": { "slug": "cool-cats" } })),
            ("/collection/cool-cats", json!({ "collection": { "stats": { "floor_price": 0.04213 } } })),
        ]);
        let service = UniqueTokenService::new(fetch, AssetSettings::default());
        let floor = service.fetch_floor_price(Network::Mainnet, "0xabc/1").await.unwrap();
        assert_eq!(floor, "0.0421 ETH");
    }

    #[tokio::test]
    async fn test_zero_floor_is_none() {
        let fetch = RoutedFetch::new(vec![
            ("/asset/0xabc/1", json!({ "collection": { "slug": "empty" } })),
            ("/collection/empty", json!({ "collection": { "stats": { "floor_price": 0 } } })),
        ]);
        let service = UniqueTokenService::new(fetch, AssetSettings::default());
        assert_eq!(
            service.fetch_floor_price(Network::Mainnet, "0xabc/1").await.unwrap(),
            "None"
        );
    }
}
