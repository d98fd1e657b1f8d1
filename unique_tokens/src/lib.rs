pub mod cache;
pub mod controller;
pub mod error;
pub mod state;

pub use cache::{storage_key, InMemoryUniqueTokenCache, UniqueTokenCache};
pub use controller::{UniqueTokenSource, UniqueTokensController};
pub use error::UniqueTokensError;
pub use state::{reduce, UniqueTokensAction, UniqueTokensState};
