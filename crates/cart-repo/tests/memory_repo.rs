#![cfg(feature = "memory")]

use cart_repo::memory::{InMemoryCartRepo, InMemoryOrderGateway};
use cart_types::domain::cart::{CartItem, CartSnapshot};
use cart_types::domain::money::Money;
use cart_types::domain::order::{OrderLine, OrderQuote, PlaceOrderRequest, RestaurantRef};
use cart_types::ports::cart_repository::CartRepository;
use cart_types::ports::order_gateway::OrderGateway;

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
async fn memory_repo_round_trip() {
    let repo = InMemoryCartRepo::new();
    assert!(repo.load().await.unwrap().is_none());

    repo.save(&snapshot()).await.unwrap();
    assert_eq!(repo.load().await.unwrap(), Some(snapshot()));

    repo.save(&CartSnapshot::default()).await.unwrap();
    assert_eq!(repo.load().await.unwrap(), Some(CartSnapshot::default()));
}

#[tokio::test]
async fn memory_repo_keys_are_isolated() {
    let a = InMemoryCartRepo::with_key("a");
    let b = a.scoped("b");
    a.save(&snapshot()).await.unwrap();
    assert!(b.load().await.unwrap().is_none());
    assert_eq!(a.clone().load().await.unwrap(), Some(snapshot()));
}

#[tokio::test]
async fn memory_gateway_records_orders() {
    let gateway = InMemoryOrderGateway::new();
    let line = OrderLine {
        dish_id: "D1".into(),
        name: "Pizza".into(),
        quantity: 1,
        unit_price: Money::from_cents(850),
        line_total: Money::from_cents(850),
    };
    let request = PlaceOrderRequest::new(
        "user-1".into(),
        &RestaurantRef {
            id: "R1".into(),
            name: "Papa Johns".into(),
        },
        vec![line],
        OrderQuote::new(Money::from_cents(850), Money::from_cents(200)),
        chrono::Utc::now(),
    )
    .unwrap();

    let placed = gateway.create_order(&request).await.unwrap();
    assert_eq!(gateway.orders.len(), 1);
    assert_eq!(gateway.orders.get(&placed.id).unwrap().total, Money::from_cents(1050));
}
