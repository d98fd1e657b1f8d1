mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config_manager::SystemConfig;
use opensea_client::{
    AbbreviatingResolver, AssetSettings, HistorySettings, Network, OpenSeaClient, RemoteFetch,
    TokenHistoryService, UniqueTokenService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};
use unique_tokens::{InMemoryUniqueTokenCache, UniqueTokensController};

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `debug_mode` only raises the level when RUST_LOG does not choose one
fn raise_to_debug(debug_mode: bool, rust_log_set: bool) -> bool {
    debug_mode && !rust_log_set
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let config = SystemConfig::load().context("Failed to load configuration")?;

    if raise_to_debug(
        config.system.debug_mode,
        std::env::var_os(EnvFilter::DEFAULT_ENV).is_some(),
    ) {
        filter_handle
            .reload(EnvFilter::new("debug"))
            .context("Failed to raise log level")?;
        debug!("Debug mode enabled");
    }

    let network: Network = cli
        .network
        .as_deref()
        .unwrap_or(config.unique_tokens.default_network.as_str())
        .parse()?;

    let client = OpenSeaClient::from_config(&config.opensea)?;
    client.log_target(network);
    let fetcher: Arc<dyn RemoteFetch> = Arc::new(client);

    match cli.command {
        Commands::History {
            contract,
            token_id,
            account,
            abbreviate,
        } => {
            let mut service =
                TokenHistoryService::new(fetcher, HistorySettings::from(&config.opensea));
            if abbreviate {
                service = service.with_resolver(Arc::new(AbbreviatingResolver::default()));
            }

            let events = service
                .fetch_token_history(network, &contract, &token_id, &account)
                .await?;
            info!("📜 {} events for {}/{}", events.len(), contract, token_id);
            print_json(&events)?;
        }
        Commands::Tokens { owner, watch } => {
            let service = UniqueTokenService::new(fetcher, AssetSettings::from(&config.opensea));

            if watch {
                watch_unique_tokens(&owner, network, service, &config).await?;
            } else {
                let tokens = service.fetch_all_account_unique_tokens(network, &owner).await?;
                print_json(&tokens)?;
            }
        }
        Commands::Price {
            account,
            url_suffix,
            kind,
        } => {
            let service = UniqueTokenService::new(fetcher, AssetSettings::from(&config.opensea));
            let price = service
                .fetch_last_sale_or_list_price(&account, network, &url_suffix, kind.into())
                .await?;
            print_json(&price)?;
        }
        Commands::Floor { url_suffix } => {
            let service = UniqueTokenService::new(fetcher, AssetSettings::from(&config.opensea));
            let floor = service.fetch_floor_price(network, &url_suffix).await?;
            print_json(&floor)?;
        }
    }

    Ok(())
}

/// Keep the account's collection fresh until Ctrl-C
async fn watch_unique_tokens(
    owner: &str,
    network: Network,
    service: UniqueTokenService,
    config: &SystemConfig,
) -> Result<()> {
    let controller = UniqueTokensController::from_config(
        owner,
        network,
        Arc::new(service),
        Arc::new(InMemoryUniqueTokenCache::new()),
        &config.unique_tokens,
    );

    controller.load_state().await;
    if let Err(e) = controller.refresh_state().await {
        warn!("⚠️ Initial refresh failed, polling continues: {}", e);
    }

    let report_every = Duration::from_secs(config.unique_tokens.refresh_interval_seconds);
    let mut last_reported = None;
    loop {
        let state = controller.state().await;
        if state.last_refreshed_at != last_reported {
            last_reported = state.last_refreshed_at;
            print_json(&serde_json::json!({
                "account": owner,
                "network": network.as_str(),
                "unique_tokens": state.unique_tokens.len(),
                "last_refreshed_at": state.last_refreshed_at,
            }))?;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Stopping unique token refresh");
                controller.stop_polling().await;
                return Ok(());
            }
            _ = tokio::time::sleep(report_every) => {}
        }
    }
}
