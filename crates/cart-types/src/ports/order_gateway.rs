use async_trait::async_trait;

use crate::domain::order::{PlaceOrderRequest, PlacedOrder};

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("order rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Creates the order on the hosted backend.
#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    async fn create_order(&self, request: &PlaceOrderRequest) -> Result<PlacedOrder, GatewayError>;
}

#[async_trait]
impl<T: OrderGateway + ?Sized> OrderGateway for std::sync::Arc<T> {
    async fn create_order(&self, request: &PlaceOrderRequest) -> Result<PlacedOrder, GatewayError> {
        (**self).create_order(request).await
    }
}
