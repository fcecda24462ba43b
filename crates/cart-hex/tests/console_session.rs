use std::sync::Arc;

use cart_hex::application::cart_store::CartStore;
use cart_hex::application::checkout_service::{CheckoutService, CheckoutSettings};
use cart_hex::inbound::Console;
use cart_repo::memory::InMemoryOrderGateway;

async fn run_script(script: &str) -> (String, Arc<CartStore>, InMemoryOrderGateway) {
    let store = Arc::new(CartStore::new());
    let gateway = InMemoryOrderGateway::new();
    let checkout = CheckoutService::new(
        store.clone(),
        gateway.clone(),
        CheckoutSettings::default(),
    );
    let console = Console::new(store.clone(), checkout);

    let mut out = Vec::new();
    console.run(script.as_bytes(), &mut out).await.unwrap();
    (String::from_utf8(out).unwrap(), store, gateway)
}

#[tokio::test]
async fn browse_and_check_out() {
    let script = "\
add D1 8.50 Margherita
add D1 8.50 Margherita
add D2 5.00 Caesar Salad

show
quote
remove D1
qty D1
checkout user-1 R1 Papa Johns
show
";
    let (out, store, gateway) = run_script(script).await;
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "1 x Margherita in cart");
    assert_eq!(lines[1], "2 x Margherita in cart");
    assert_eq!(lines[2], "1 x Caesar Salad in cart");
    assert_eq!(lines[3], "2 x Margherita (D1) @ $8.50 = $17.00");
    assert_eq!(lines[4], "1 x Caesar Salad (D2) @ $5.00 = $5.00");
    assert_eq!(lines[5], "subtotal $22.00");
    assert_eq!(lines[6], "subtotal $22.00");
    assert_eq!(lines[7], "delivery fee $2.00");
    assert_eq!(lines[8], "order total $24.00");
    assert_eq!(lines[9], "removed one Margherita, 1 left");
    assert_eq!(lines[10], "D1: 1");
    assert!(lines[11].starts_with("order #"));
    assert!(lines[11].contains("placed with Papa Johns"));
    assert_eq!(lines[12], "cart is empty");

    assert!(store.is_empty());
    assert_eq!(gateway.orders.len(), 1);
}

#[tokio::test]
async fn errors_are_reported_and_session_continues() {
    let script = "\
remove D9
add D1 -1 Refund
checkout user-1 R1 Papa Johns
frobnicate
add D1 1.00 Tea
quit
add D2 1.00 Never
";
    let (out, store, gateway) = run_script(script).await;
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "D9 is not in the cart");
    assert!(lines[1].starts_with("error: invalid cart item"));
    assert_eq!(lines[2], "error: your cart is empty");
    assert!(lines[3].starts_with("error: unknown command"));
    assert_eq!(lines[4], "1 x Tea in cart");
    assert_eq!(lines.len(), 5);

    assert_eq!(store.len(), 1);
    assert!(gateway.orders.is_empty());
}
