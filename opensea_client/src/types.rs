use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OpenSeaError;

/// Ethereum networks OpenSea serves, one API host per network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Ropsten,
    Kovan,
    Rinkeby,
    Goerli,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Ropsten => "ropsten",
            Network::Kovan => "kovan",
            Network::Rinkeby => "rinkeby",
            Network::Goerli => "goerli",
        }
    }

    /// Host prefix: empty on mainnet, `"{network}-"` everywhere else
    pub fn host_prefix(&self) -> String {
        match self {
            Network::Mainnet => String::new(),
            other => format!("{}-", other.as_str()),
        }
    }
}

impl FromStr for Network {
    type Err = OpenSeaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = config_manager::normalize_network(s).map_err(|_| {
            OpenSeaError::InvalidNetwork {
                network: s.to_string(),
            }
        })?;

        match normalized.as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "ropsten" => Ok(Network::Ropsten),
            "kovan" => Ok(Network::Kovan),
            "rinkeby" => Ok(Network::Rinkeby),
            "goerli" => Ok(Network::Goerli),
            _ => Err(OpenSeaError::InvalidNetwork {
                network: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `"123"`, `123`, `1.5` or `null` and keeps the textual form
fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountRef {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentToken {
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetContract {
    pub address: Option<String>,
    pub asset_contract_type: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub schema_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAsset {
    pub token_id: Option<String>,
    pub asset_contract: Option<AssetContract>,
}

/// One record from `/api/v1/events`. Every field is optional so a sparse or
/// partially broken record still decodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMarketEvent {
    pub event_type: Option<String>,
    pub created_date: Option<String>,
    pub from_account: Option<AccountRef>,
    pub to_account: Option<AccountRef>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub total_price: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub starting_price: Option<String>,
    pub payment_token: Option<PaymentToken>,
    pub asset: Option<EventAsset>,
}

impl RawMarketEvent {
    pub fn from_address(&self) -> Option<&str> {
        self.from_account.as_ref()?.address.as_deref()
    }

    pub fn to_address(&self) -> Option<&str> {
        self.to_account.as_ref()?.address.as_deref()
    }

    pub fn payment_symbol(&self) -> Option<&str> {
        self.payment_token.as_ref()?.symbol.as_deref()
    }

    pub fn asset_contract_type(&self) -> Option<&str> {
        self.asset
            .as_ref()?
            .asset_contract
            .as_ref()?
            .asset_contract_type
            .as_deref()
    }
}

/// Body of `/api/v1/events`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub asset_events: Option<Vec<RawMarketEvent>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionRef {
    pub slug: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastSale {
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub total_price: Option<String>,
    pub payment_token: Option<PaymentToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SellOrder {
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub current_price: Option<String>,
    pub payment_token_contract: Option<PaymentToken>,
}

/// One NFT owned by an account, as returned by `/api/v1/assets`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueTokenAsset {
    pub id: Option<u64>,
    pub token_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_preview_url: Option<String>,
    pub permalink: Option<String>,
    pub asset_contract: Option<AssetContract>,
    pub collection: Option<CollectionRef>,
    pub last_sale: Option<LastSale>,
    pub sell_orders: Option<Vec<SellOrder>>,
}

impl UniqueTokenAsset {
    /// `"{contract}/{token_id}"`, the suffix used by the single-asset endpoints
    pub fn url_suffix(&self) -> Option<String> {
        let contract = self.asset_contract.as_ref()?.address.as_deref()?;
        let token_id = self.token_id.as_deref()?;
        Some(format!("{}/{}", contract, token_id))
    }
}

/// Body of `/api/v1/assets`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetsResponse {
    #[serde(default)]
    pub assets: Option<Vec<UniqueTokenAsset>>,
}

/// Body of `/api/v1/asset/{contract}/{token_id}`; only the collection is read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetDetailResponse {
    #[serde(default)]
    pub collection: Option<CollectionRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionStats {
    #[serde(deserialize_with = "deserialize_optional_amount")]
    pub floor_price: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionDetail {
    pub slug: Option<String>,
    pub stats: Option<CollectionStats>,
}

/// Body of `/api/v1/collection/{slug}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionResponse {
    #[serde(default)]
    pub collection: Option<CollectionDetail>,
}

/// Event kinds surfaced to the activity list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryEventType {
    Created,
    Successful,
    Transfer,
    Cancelled,
    Mint,
    EnsRegistration,
}

impl HistoryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEventType::Created => "created",
            HistoryEventType::Successful => "successful",
            HistoryEventType::Transfer => "transfer",
            HistoryEventType::Cancelled => "cancelled",
            HistoryEventType::Mint => "mint",
            HistoryEventType::EnsRegistration => "ens-registration",
        }
    }
}

/// Display-ready activity record for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub created_date: String,
    pub event_type: HistoryEventType,
    pub from_account: String,
    pub to_account: String,
    pub to_account_eth_address: String,
    pub list_amount: String,
    pub sale_amount: String,
    pub payment_token: String,
}

/// Which price `fetch_last_sale_or_list_price` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceKind {
    LastSale,
    CurrentListing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_network_conversion() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("Rinkeby".parse::<Network>().unwrap(), Network::Rinkeby);
        assert!("solana".parse::<Network>().is_err());

        assert_eq!(Network::Mainnet.host_prefix(), "");
        assert_eq!(Network::Rinkeby.host_prefix(), "rinkeby-");
    }

    #[test]
    fn test_raw_event_tolerates_sparse_records() {
        let event: RawMarketEvent = serde_json::from_value(json!({
            "event_type": "successful",
            "total_price": 1500,
            "from_account": null,
            "payment_token": { "symbol": "WETH" },
            "unexpected_field": [1, 2, 3]
        }))
        .unwrap();

        assert_eq!(event.event_type.as_deref(), Some("successful"));
        assert_eq!(event.total_price.as_deref(), Some("1500"));
        assert_eq!(event.starting_price, None);
        assert_eq!(event.from_address(), None);
        assert_eq!(event.payment_symbol(), Some("WETH"));
        assert_eq!(event.asset_contract_type(), None);
    }

    #[test]
    fn test_events_response_without_list() {
        let response: EventsResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.asset_events.is_none());

        let response: EventsResponse =
            serde_json::from_value(json!({ "asset_events": null })).unwrap();
        assert!(response.asset_events.is_none());
    }

    #[test]
    fn test_history_event_type_serialization() {
        assert_eq!(
            serde_json::to_value(HistoryEventType::EnsRegistration).unwrap(),
            json!("ens-registration")
        );
        assert_eq!(HistoryEventType::Mint.as_str(), "mint");
    }

    #[test]
    fn test_unique_token_url_suffix() {
        let asset: UniqueTokenAsset = serde_json::from_value(json!({
            "token_id": "42",
            "asset_contract": { "address": "0xabc" }
        }))
        .unwrap();
        assert_eq!(asset.url_suffix().as_deref(), Some("0xabc/42"));
        assert_eq!(UniqueTokenAsset::default().url_suffix(), None);
    }
}
