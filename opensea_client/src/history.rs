use crate::client::{build_endpoint, decode, ApiRequest, RemoteFetch};
use crate::error::OpenSeaError;
use crate::normalizer::{AddressResolver, EventNormalizer, IdentityResolver};
use crate::types::{EventsResponse, Network, NormalizedEvent, RawMarketEvent};
use config_manager::{HistoryOffsetPolicy, OpenSeaConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Events requested per history page. A page of exactly this size means
/// more pages may follow.
pub const HISTORY_PAGE_SIZE: usize = 299;

const SEMI_FUNGIBLE_CONTRACT_TYPE: &str = "semi-fungible";

/// Settings the history pipeline depends on
#[derive(Debug, Clone)]
pub struct HistorySettings {
    pub api_host: String,
    pub request_timeout: Duration,
    pub offset_policy: HistoryOffsetPolicy,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            api_host: "api.opensea.io".to_string(),
            request_timeout: Duration::from_secs(10),
            offset_policy: HistoryOffsetPolicy::SkipOne,
        }
    }
}

impl From<&OpenSeaConfig> for HistorySettings {
    fn from(config: &OpenSeaConfig) -> Self {
        Self {
            api_host: config.api_host.clone(),
            request_timeout: Duration::from_secs(config.history_timeout_seconds),
            offset_policy: config.history_offset_policy,
        }
    }
}

/// One page of the events query
#[derive(Debug, Clone, Copy)]
struct EventsQuery<'a> {
    account_address: Option<&'a str>,
    contract_address: &'a str,
    token_id: &'a str,
    offset: usize,
    limit: usize,
}

/// Activity history for a single token: fungibility probe, paginated event
/// fetch and classification
#[derive(Clone)]
pub struct TokenHistoryService {
    fetcher: Arc<dyn RemoteFetch>,
    resolver: Arc<dyn AddressResolver>,
    settings: HistorySettings,
}

impl TokenHistoryService {
    pub fn new(fetcher: Arc<dyn RemoteFetch>, settings: HistorySettings) -> Self {
        Self {
            fetcher,
            resolver: Arc::new(IdentityResolver),
            settings,
        }
    }

    /// Replace the identity resolver used for `to_account`
    pub fn with_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    fn events_request(
        &self,
        network: Network,
        query: EventsQuery<'_>,
    ) -> Result<ApiRequest, OpenSeaError> {
        let mut url = build_endpoint(&self.settings.api_host, network, "events")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(account) = query.account_address {
                pairs.append_pair("account_address", account);
            }
            pairs
                .append_pair("asset_contract_address", query.contract_address)
                .append_pair("token_id", query.token_id)
                .append_pair("only_opensea", "false")
                .append_pair("offset", &query.offset.to_string())
                .append_pair("limit", &query.limit.to_string());
        }
        Ok(ApiRequest::new(url, self.settings.request_timeout))
    }

    async fn fetch_events_page(
        &self,
        network: Network,
        query: EventsQuery<'_>,
    ) -> Result<Vec<RawMarketEvent>, OpenSeaError> {
        let request = self.events_request(network, query)?;
        debug!("🌐 URL: {}", request.url);
        let body = self.fetcher.fetch_json(&request).await?;
        let response: EventsResponse = decode(body, "events")?;
        Ok(response.asset_events.unwrap_or_default())
    }

    /// Probe one event to learn whether the contract is semi-fungible
    /// (ERC-1155 style), which decides whether history is account scoped
    pub async fn probe_semi_fungible(
        &self,
        network: Network,
        contract_address: &str,
        token_id: &str,
    ) -> Result<bool, OpenSeaError> {
        let events = self
            .fetch_events_page(
                network,
                EventsQuery {
                    account_address: None,
                    contract_address,
                    token_id,
                    offset: 0,
                    limit: 1,
                },
            )
            .await?;

        let semi_fungible = events
            .first()
            .and_then(|event| event.asset_contract_type())
            == Some(SEMI_FUNGIBLE_CONTRACT_TYPE);

        debug!(
            "Contract {} token {} semi-fungible: {}",
            contract_address, token_id, semi_fungible
        );
        Ok(semi_fungible)
    }

    /// Fetch every raw event page until a short page arrives.
    /// A failed page aborts the whole walk.
    pub async fn fetch_all_events(
        &self,
        network: Network,
        semi_fungible: bool,
        account_address: &str,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Vec<RawMarketEvent>, OpenSeaError> {
        let start_time = std::time::Instant::now();
        let mut all_events: Vec<RawMarketEvent> = Vec::new();
        let mut offset = 0usize;
        let mut page_num = 1u32;

        loop {
            let page = self
                .fetch_events_page(
                    network,
                    EventsQuery {
                        account_address: semi_fungible.then_some(account_address),
                        contract_address,
                        token_id,
                        offset,
                        limit: HISTORY_PAGE_SIZE,
                    },
                )
                .await?;

            let page_len = page.len();
            debug!(
                "📄 Page {}: {} events at offset {}",
                page_num, page_len, offset
            );

            all_events.extend(page);
            offset = self.settings.offset_policy.next_offset(all_events.len());

            if page_len != HISTORY_PAGE_SIZE {
                break;
            }
            page_num += 1;
        }

        info!(
            "📊 Fetched {} history events for {}/{} in {} pages ({}ms)",
            all_events.len(),
            contract_address,
            token_id,
            page_num,
            start_time.elapsed().as_millis()
        );

        Ok(all_events)
    }

    /// Full activity history for one token, in the order the API returns it
    pub async fn fetch_token_history(
        &self,
        network: Network,
        contract_address: &str,
        token_id: &str,
        account_address: &str,
    ) -> Result<Vec<NormalizedEvent>, OpenSeaError> {
        self.load_token_history(network, contract_address, token_id, account_address)
            .await
            .map_err(|e| {
                debug!("FETCH ERROR: {}", e);
                e
            })
    }

    async fn load_token_history(
        &self,
        network: Network,
        contract_address: &str,
        token_id: &str,
        account_address: &str,
    ) -> Result<Vec<NormalizedEvent>, OpenSeaError> {
        let semi_fungible = self
            .probe_semi_fungible(network, contract_address, token_id)
            .await?;

        let raw_events = self
            .fetch_all_events(
                network,
                semi_fungible,
                account_address,
                contract_address,
                token_id,
            )
            .await?;

        Ok(EventNormalizer::new(contract_address, self.resolver.as_ref())
            .normalize_events(&raw_events))
    }
}
