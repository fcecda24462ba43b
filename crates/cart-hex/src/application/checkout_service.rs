use std::sync::Arc;

use cart_types::domain::money::Money;
use cart_types::domain::order::{
    OrderLine, OrderQuote, PlaceOrderRequest, PlacedOrder, RestaurantRef,
};
use cart_types::ports::order_gateway::OrderGateway;
use chrono::{Duration, Utc};
use tracing::Instrument;
use uuid::Uuid;

use crate::application::cart_store::CartStore;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    pub delivery_fee: Money,
    pub delivery_eta: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            delivery_fee: Money::from_cents(200),
            delivery_eta: Duration::minutes(30),
        }
    }
}

/// Turns the cart into an order on the backend and empties it afterwards.
pub struct CheckoutService<G: OrderGateway> {
    store: Arc<CartStore>,
    gateway: G,
    settings: CheckoutSettings,
}

impl<G: OrderGateway> CheckoutService<G> {
    pub fn new(store: Arc<CartStore>, gateway: G, settings: CheckoutSettings) -> Self {
        Self {
            store,
            gateway,
            settings,
        }
    }

    pub fn quote(&self) -> OrderQuote {
        OrderQuote::new(self.store.subtotal(), self.settings.delivery_fee)
    }

    /// The cart is cleared only once the backend has accepted the order;
    /// any failure leaves it as it was.
    ///
    /// The clear empties the whole cart, so units added while the request
    /// is in flight are dropped too. Callers that keep editing during
    /// checkout should block the cart until this returns.
    pub async fn place_order(
        &self,
        user_id: String,
        restaurant: &RestaurantRef,
    ) -> Result<PlacedOrder, AppError> {
        let checkout_id = Uuid::new_v4();
        let span = tracing::info_span!("checkout", %checkout_id, restaurant = %restaurant.id);
        self.place_order_inner(user_id, restaurant)
            .instrument(span)
            .await
    }

    async fn place_order_inner(
        &self,
        user_id: String,
        restaurant: &RestaurantRef,
    ) -> Result<PlacedOrder, AppError> {
        let groups = self.store.grouped_view();
        if groups.is_empty() {
            return Err(AppError::EmptyCart);
        }
        let lines: Vec<OrderLine> = groups.iter().filter_map(OrderLine::from_group).collect();
        let subtotal = groups.iter().map(|g| g.line_total()).sum();
        let quote = OrderQuote::new(subtotal, self.settings.delivery_fee);
        let eta = Utc::now() + self.settings.delivery_eta;

        let request = PlaceOrderRequest::new(user_id, restaurant, lines, quote, eta)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let placed = match self.gateway.create_order(&request).await {
            Ok(placed) => placed,
            Err(e) => {
                tracing::warn!(error = %e, "order placement failed, keeping cart");
                return Err(e.into());
            }
        };

        self.store.clear();
        tracing::info!(
            order_id = %placed.id,
            total = %quote.total,
            eta = %placed.estimated_delivery_time,
            "order placed"
        );
        Ok(placed)
    }

    /// Drops the cart without ordering, e.g. when the user backs out
    /// before paying.
    pub fn abandon(&self) {
        tracing::info!(items = self.store.len(), "checkout abandoned");
        self.store.clear();
    }
}
