use std::sync::Arc;

use anyhow::Context;
use cart_client::OrdersClient;
use cart_hex::application::cart_store::CartStore;
use cart_hex::application::checkout_service::{CheckoutService, CheckoutSettings};
use cart_hex::application::persister::CartPersister;
use cart_hex::config::Config;
use cart_hex::inbound::Console;
use cart_repo::memory::InMemoryOrderGateway;
use cart_repo::{build_repo, Repo};
use cart_types::ports::order_gateway::OrderGateway;
use tokio::io::BufReader;

fn build_gateway(config: &Config) -> anyhow::Result<Arc<dyn OrderGateway>> {
    match config.orders_api_url.as_deref() {
        Some(url) => {
            let mut builder = OrdersClient::builder(url)?
                .with_timeout(std::time::Duration::from_secs(15));
            if let Some(key) = config.orders_api_key.as_deref() {
                builder = builder.with_api_key(key)?;
            }
            tracing::info!(%url, "placing orders against backend");
            Ok(Arc::new(builder.build()?))
        }
        None => {
            tracing::warn!("ORDERS_API_URL not set, orders are kept in memory");
            Ok(Arc::new(InMemoryOrderGateway::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / ORDERS_API_URL when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let repo: Arc<Repo> = Arc::new(
        build_repo(config.database_url.as_deref(), &config.snapshot_key)
            .await
            .context("failed to open cart storage")?,
    );
    tracing::info!(storage = repo.kind(), key = %config.snapshot_key, "cart storage ready");

    let store = Arc::new(CartStore::new());
    store.restore_from(repo.as_ref()).await;
    let persister = CartPersister::spawn(&store, repo.clone());

    let settings = CheckoutSettings {
        delivery_fee: config.delivery_fee,
        delivery_eta: chrono::Duration::minutes(config.delivery_eta_minutes),
    };
    let checkout = CheckoutService::new(store.clone(), build_gateway(&config)?, settings);
    let console = Console::new(store.clone(), checkout);

    let result = console
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await;

    persister.shutdown().await;
    store.teardown();
    result
}
