///  To run :
///  cargo r --example checkout_demo
use std::sync::Arc;

use cart_hex::application::cart_store::CartStore;
use cart_hex::application::checkout_service::{CheckoutService, CheckoutSettings};
use cart_hex::application::persister::CartPersister;
use cart_hex::inbound::Console;
use cart_repo::memory::InMemoryOrderGateway;
use cart_repo::build_repo;
use tempfile::tempdir;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Temp file-backed SQLite DB so the second session sees the first one's cart.
    let tmp = tempdir()?;
    let db_url = format!("sqlite://{}", tmp.path().join("cart.db").display());
    let gateway = InMemoryOrderGateway::new();

    // First session: fill the cart, then leave without ordering.
    {
        let repo = Arc::new(build_repo(Some(&db_url), "demo").await?);
        let store = Arc::new(CartStore::new());
        store.restore_from(repo.as_ref()).await;
        let persister = CartPersister::spawn(&store, repo.clone());
        let checkout =
            CheckoutService::new(store.clone(), gateway.clone(), CheckoutSettings::default());
        let script = "add D1 8.50 Margherita\nadd D1 8.50 Margherita\nadd D2 5.00 Caesar Salad\nshow\n";
        Console::new(store.clone(), checkout)
            .run(script.as_bytes(), tokio::io::stdout())
            .await?;
        persister.shutdown().await;
        store.teardown();
    }

    // Second session: the cart comes back from storage and gets ordered.
    let repo = Arc::new(build_repo(Some(&db_url), "demo").await?);
    let store = Arc::new(CartStore::new());
    let restored = store.restore_from(repo.as_ref()).await;
    println!("restored {restored} cart entries");
    let persister = CartPersister::spawn(&store, repo.clone());
    let checkout = CheckoutService::new(
        store.clone(),
        gateway.clone(),
        CheckoutSettings::default(),
    );
    let script = "remove D1\nquote\ncheckout demo-user R1 Papa Johns\nshow\n";
    Console::new(store.clone(), checkout)
        .run(script.as_bytes(), tokio::io::stdout())
        .await?;
    persister.shutdown().await;

    assert!(store.is_empty());
    assert_eq!(gateway.orders.len(), 1);
    println!("orders recorded: {}", gateway.orders.len());
    Ok(())
}
