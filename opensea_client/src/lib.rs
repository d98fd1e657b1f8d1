pub mod assets;
pub mod client;
pub mod display;
pub mod error;
pub mod history;
pub mod normalizer;
pub mod types;

pub use assets::{AssetSettings, UniqueTokenService, UNIQUE_TOKENS_LIMIT_PER_PAGE, UNIQUE_TOKENS_LIMIT_TOTAL};
pub use client::{ApiRequest, OpenSeaClient, RemoteFetch};
pub use error::{ErrorKind, OpenSeaError};
pub use history::{HistorySettings, TokenHistoryService, HISTORY_PAGE_SIZE};
pub use normalizer::{
    normalize_events, AbbreviatingResolver, AddressResolver, EventNormalizer, IdentityResolver,
    ENS_NFT_CONTRACT_ADDRESS, ZERO_ADDRESS,
};
pub use types::*;
