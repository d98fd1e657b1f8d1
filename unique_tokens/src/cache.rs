use crate::error::UniqueTokensError;
use async_trait::async_trait;
use opensea_client::{Network, UniqueTokenAsset};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

const UNIQUE_TOKENS_KEY_PREFIX: &str = "uniquetokens";

/// Storage key for one account's collection on one network
pub fn storage_key(account_address: &str, network: Network) -> String {
    format!(
        "{}-{}-{}",
        UNIQUE_TOKENS_KEY_PREFIX,
        account_address.to_lowercase(),
        network
    )
}

/// Key-value store holding the last fetched collection per account
#[async_trait]
pub trait UniqueTokenCache: Send + Sync {
    async fn get_unique_tokens(
        &self,
        account_address: &str,
        network: Network,
    ) -> Result<Option<Vec<UniqueTokenAsset>>, UniqueTokensError>;

    async fn save_unique_tokens(
        &self,
        account_address: &str,
        unique_tokens: &[UniqueTokenAsset],
        network: Network,
    ) -> Result<(), UniqueTokensError>;

    async fn remove_unique_tokens(
        &self,
        account_address: &str,
        network: Network,
    ) -> Result<(), UniqueTokensError>;
}

/// Process-local store keeping JSON documents, as a device key-value store would
#[derive(Debug, Default)]
pub struct InMemoryUniqueTokenCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryUniqueTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl UniqueTokenCache for InMemoryUniqueTokenCache {
    async fn get_unique_tokens(
        &self,
        account_address: &str,
        network: Network,
    ) -> Result<Option<Vec<UniqueTokenAsset>>, UniqueTokensError> {
        let key = storage_key(account_address, network);
        let entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(document) => Ok(Some(serde_json::from_str(document)?)),
            None => {
                debug!("No cached unique tokens under {}", key);
                Ok(None)
            }
        }
    }

    async fn save_unique_tokens(
        &self,
        account_address: &str,
        unique_tokens: &[UniqueTokenAsset],
        network: Network,
    ) -> Result<(), UniqueTokensError> {
        let document = serde_json::to_string(unique_tokens)?;
        self.entries
            .lock()
            .await
            .insert(storage_key(account_address, network), document);
        Ok(())
    }

    async fn remove_unique_tokens(
        &self,
        account_address: &str,
        network: Network,
    ) -> Result<(), UniqueTokensError> {
        self.entries
            .lock()
            .await
            .remove(&storage_key(account_address, network));
        Ok(())
    }
}
