use opensea_client::OpenSeaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UniqueTokensError {
    #[error("Marketplace request failed: {0}")]
    Fetch(#[from] OpenSeaError),

    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
