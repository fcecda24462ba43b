#![cfg(feature = "sqlite")]

use cart_repo::sqlite::SqliteCartRepo;
use cart_types::domain::cart::{CartItem, CartSnapshot};
use cart_types::domain::money::Money;
use cart_types::ports::cart_repository::CartRepository;
use std::path::PathBuf;
use uuid::Uuid;

fn temp_db_url() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut path = PathBuf::from(dir.path());
    path.push(format!("cart-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    (dir, url)
}

fn snapshot() -> CartSnapshot {
    CartSnapshot {
        items: vec![
            CartItem::new("D1", "Pizza", Money::from_cents(850)).with_image("pizza.png"),
            CartItem::new("D2", "Salad", Money::from_cents(500)),
            CartItem::new("D1", "Pizza", Money::from_cents(850)),
        ],
    }
}

#[tokio::test]
async fn sqlite_repo_round_trip_survives_reopen() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteCartRepo::new(&url, "cart").await.unwrap();
    assert!(repo.load().await.unwrap().is_none());

    repo.save(&snapshot()).await.unwrap();
    drop(repo);

    let reopened = SqliteCartRepo::new(&url, "cart").await.unwrap();
    assert_eq!(reopened.load().await.unwrap(), Some(snapshot()));
}

#[tokio::test]
async fn sqlite_repo_overwrites_and_stores_empty() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteCartRepo::new(&url, "cart").await.unwrap();

    repo.save(&snapshot()).await.unwrap();
    repo.save(&CartSnapshot::default()).await.unwrap();
    assert_eq!(repo.load().await.unwrap(), Some(CartSnapshot::default()));

    let other = SqliteCartRepo::new(&url, "other").await.unwrap();
    assert!(other.load().await.unwrap().is_none());
}
