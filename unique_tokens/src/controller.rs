use crate::cache::UniqueTokenCache;
use crate::error::UniqueTokensError;
use crate::state::{reduce, UniqueTokensAction, UniqueTokensState};
use async_trait::async_trait;
use config_manager::UniqueTokensConfig;
use opensea_client::{Network, OpenSeaError, UniqueTokenAsset, UniqueTokenService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where the controller gets an account's collection from
#[async_trait]
pub trait UniqueTokenSource: Send + Sync {
    async fn fetch_unique_tokens(
        &self,
        network: Network,
        owner: &str,
    ) -> Result<Vec<UniqueTokenAsset>, OpenSeaError>;
}

#[async_trait]
impl UniqueTokenSource for UniqueTokenService {
    async fn fetch_unique_tokens(
        &self,
        network: Network,
        owner: &str,
    ) -> Result<Vec<UniqueTokenAsset>, OpenSeaError> {
        self.fetch_all_account_unique_tokens(network, owner).await
    }
}

/// Everything one refresh needs; cloned into the polling task
#[derive(Clone)]
struct RefreshContext {
    account_address: String,
    network: Network,
    source: Arc<dyn UniqueTokenSource>,
    cache: Arc<dyn UniqueTokenCache>,
    state: Arc<RwLock<UniqueTokensState>>,
}

impl RefreshContext {
    async fn dispatch(&self, action: UniqueTokensAction) {
        debug!("dispatch {}", action.name());
        let mut state = self.state.write().await;
        *state = reduce(&state, action);
    }

    async fn fetch_unique_tokens(&self) -> Result<usize, UniqueTokensError> {
        match self
            .source
            .fetch_unique_tokens(self.network, &self.account_address)
            .await
        {
            Ok(unique_tokens) => {
                if let Err(e) = self
                    .cache
                    .save_unique_tokens(&self.account_address, &unique_tokens, self.network)
                    .await
                {
                    warn!("⚠️ Failed to cache unique tokens: {}", e);
                }

                let count = unique_tokens.len();
                self.dispatch(UniqueTokensAction::GetSuccess {
                    unique_tokens,
                    refreshed_at: chrono::Utc::now(),
                })
                .await;
                Ok(count)
            }
            Err(e) => {
                self.dispatch(UniqueTokensAction::GetFailure).await;
                Err(e.into())
            }
        }
    }
}

/// Owns the unique token state and refresh polling for one account session.
/// Dropping the controller stops polling.
pub struct UniqueTokensController {
    context: RefreshContext,
    refresh_interval: Duration,
    refresh_handle: Mutex<Option<JoinHandle<()>>>,
}

impl UniqueTokensController {
    pub fn new(
        account_address: impl Into<String>,
        network: Network,
        source: Arc<dyn UniqueTokenSource>,
        cache: Arc<dyn UniqueTokenCache>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            context: RefreshContext {
                account_address: account_address.into(),
                network,
                source,
                cache,
                state: Arc::new(RwLock::new(UniqueTokensState::default())),
            },
            refresh_interval,
            refresh_handle: Mutex::new(None),
        }
    }

    pub fn from_config(
        account_address: impl Into<String>,
        network: Network,
        source: Arc<dyn UniqueTokenSource>,
        cache: Arc<dyn UniqueTokenCache>,
        config: &UniqueTokensConfig,
    ) -> Self {
        Self::new(
            account_address,
            network,
            source,
            cache,
            Duration::from_secs(config.refresh_interval_seconds),
        )
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> UniqueTokensState {
        self.context.state.read().await.clone()
    }

    /// Populate the state from the cache
    pub async fn load_state(&self) {
        let ctx = &self.context;
        ctx.dispatch(UniqueTokensAction::LoadRequest).await;

        match ctx
            .cache
            .get_unique_tokens(&ctx.account_address, ctx.network)
            .await
        {
            Ok(cached) => {
                let cached = cached.unwrap_or_default();
                debug!("Loaded {} cached unique tokens", cached.len());
                ctx.dispatch(UniqueTokensAction::LoadSuccess(cached)).await;
            }
            Err(e) => {
                warn!("⚠️ Failed to read cached unique tokens: {}", e);
                ctx.dispatch(UniqueTokensAction::LoadFailure).await;
            }
        }
    }

    /// Fetch the collection now, then keep refreshing it every
    /// `refresh_interval`. Polling starts even when the first fetch fails;
    /// the first fetch's outcome is returned.
    pub async fn refresh_state(&self) -> Result<usize, UniqueTokensError> {
        self.context.dispatch(UniqueTokensAction::GetRequest).await;

        let result = self.context.fetch_unique_tokens().await;
        self.restart_polling().await;

        match &result {
            Ok(count) => info!(
                "✅ Refreshed {} unique tokens for {} on {}",
                count, self.context.account_address, self.context.network
            ),
            Err(e) => warn!("⚠️ Unique token refresh failed: {}", e),
        }
        result
    }

    /// Drop cached tokens, stop polling and reset the state
    pub async fn clear_state(&self) {
        let ctx = &self.context;
        if let Err(e) = ctx
            .cache
            .remove_unique_tokens(&ctx.account_address, ctx.network)
            .await
        {
            warn!("⚠️ Failed to remove cached unique tokens: {}", e);
        }

        self.stop_polling().await;
        ctx.dispatch(UniqueTokensAction::Clear).await;
    }

    /// Whether a polling task is alive
    pub async fn is_polling(&self) -> bool {
        self.refresh_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub async fn stop_polling(&self) {
        if let Some(handle) = self.refresh_handle.lock().await.take() {
            handle.abort();
            debug!("🛑 Unique token polling stopped");
        }
    }

    async fn restart_polling(&self) {
        let mut guard = self.refresh_handle.lock().await;
        if let Some(previous) = guard.take() {
            previous.abort();
        }

        let ctx = self.context.clone();
        let interval = self.refresh_interval;
        *guard = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if let Err(e) = ctx.fetch_unique_tokens().await {
                    warn!("⚠️ Scheduled unique token refresh failed: {}", e);
                }
            }
        }));
        debug!("⏱️ Unique token polling every {}s", interval.as_secs_f64());
    }
}

impl Drop for UniqueTokensController {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_handle.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryUniqueTokenCache;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(fail),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UniqueTokenSource for CountingSource {
        async fn fetch_unique_tokens(
            &self,
            _network: Network,
            _owner: &str,
        ) -> Result<Vec<UniqueTokenAsset>, OpenSeaError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(OpenSeaError::RateLimit);
            }
            Ok(vec![UniqueTokenAsset {
                token_id: Some(call.to_string()),
                ..Default::default()
            }])
        }
    }

    const ACCOUNT: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";

    fn controller(
        source: Arc<CountingSource>,
        cache: Arc<InMemoryUniqueTokenCache>,
        interval: Duration,
    ) -> UniqueTokensController {
        UniqueTokensController::new(ACCOUNT, Network::Mainnet, source, cache, interval)
    }

    #[tokio::test]
    async fn test_load_state_reads_cache() {
        let cache = Arc::new(InMemoryUniqueTokenCache::new());
        let cached = vec![UniqueTokenAsset {
            name: Some("cached".to_string()),
            ..Default::default()
        }];
        cache
            .save_unique_tokens(ACCOUNT, &cached, Network::Mainnet)
            .await
            .unwrap();

        let controller = controller(CountingSource::new(false), cache, Duration::from_secs(60));
        controller.load_state().await;

        let state = controller.state().await;
        assert!(!state.loading_unique_tokens);
        assert_eq!(state.unique_tokens, cached);
    }

    #[tokio::test]
    async fn test_refresh_saves_and_starts_polling() {
        let source = CountingSource::new(false);
        let cache = Arc::new(InMemoryUniqueTokenCache::new());
        let controller = controller(source.clone(), cache.clone(), Duration::from_secs(60));

        assert_eq!(controller.refresh_state().await.unwrap(), 1);

        let state = controller.state().await;
        assert!(!state.fetching_unique_tokens);
        assert_eq!(state.unique_tokens.len(), 1);
        assert!(state.last_refreshed_at.is_some());
        assert_eq!(cache.len().await, 1);
        assert!(controller.is_polling().await);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_still_polls() {
        let source = CountingSource::new(true);
        let cache = Arc::new(InMemoryUniqueTokenCache::new());
        let controller = controller(source.clone(), cache.clone(), Duration::from_secs(60));

        let result = controller.refresh_state().await;
        assert!(matches!(result, Err(UniqueTokensError::Fetch(OpenSeaError::RateLimit))));

        let state = controller.state().await;
        assert!(!state.fetching_unique_tokens);
        assert!(state.unique_tokens.is_empty());
        assert!(cache.is_empty().await);
        assert!(controller.is_polling().await);
    }

    #[tokio::test]
    async fn test_polling_repeats_until_cleared() {
        let source = CountingSource::new(false);
        let cache = Arc::new(InMemoryUniqueTokenCache::new());
        let controller = controller(source.clone(), cache.clone(), Duration::from_millis(20));

        controller.refresh_state().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(source.calls() >= 3, "expected polling, saw {} calls", source.calls());

        controller.clear_state().await;
        assert!(!controller.is_polling().await);
        assert_eq!(controller.state().await, UniqueTokensState::default());
        assert!(cache.is_empty().await);

        let calls_after_clear = source.calls();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), calls_after_clear);
    }

    #[tokio::test]
    async fn test_refresh_replaces_previous_poller() {
        let source = CountingSource::new(false);
        let controller = controller(
            source.clone(),
            Arc::new(InMemoryUniqueTokenCache::new()),
            Duration::from_secs(60),
        );

        controller.refresh_state().await.unwrap();
        controller.refresh_state().await.unwrap();
        assert!(controller.is_polling().await);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_drop_stops_polling() {
        let source = CountingSource::new(false);
        let controller = controller(
            source.clone(),
            Arc::new(InMemoryUniqueTokenCache::new()),
            Duration::from_millis(20),
        );
        controller.refresh_state().await.unwrap();
        drop(controller);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let calls_after_drop = source.calls();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), calls_after_drop);
    }
}
