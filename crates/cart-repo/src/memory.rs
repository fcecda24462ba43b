use async_trait::async_trait;
use cart_types::domain::cart::CartSnapshot;
use cart_types::domain::order::{PlaceOrderRequest, PlacedOrder};
use cart_types::ports::cart_repository::{CartRepository, RepoError};
use cart_types::ports::order_gateway::{GatewayError, OrderGateway};
use dashmap::DashMap;
use std::sync::Arc;

/// Snapshot store kept in process memory. Clones share the same map, so
/// a "restart" can be simulated by building a second store from a clone.
#[derive(Clone)]
pub struct InMemoryCartRepo {
    key: String,
    pub map: Arc<DashMap<String, CartSnapshot>>,
}

impl InMemoryCartRepo {
    pub fn new() -> Self {
        Self::with_key("cart")
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            map: Arc::new(DashMap::new()),
        }
    }

    /// Another session's view of the same map.
    pub fn scoped(&self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            map: self.map.clone(),
        }
    }
}

impl Default for InMemoryCartRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepo {
    async fn save(&self, snapshot: &CartSnapshot) -> Result<(), RepoError> {
        self.map.insert(self.key.clone(), snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<CartSnapshot>, RepoError> {
        Ok(self.map.get(&self.key).map(|r| r.clone()))
    }
}

/// Accepts every order and remembers it. Used when no backend is configured.
#[derive(Clone, Default)]
pub struct InMemoryOrderGateway {
    pub orders: Arc<DashMap<String, PlaceOrderRequest>>,
}

impl InMemoryOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderGateway for InMemoryOrderGateway {
    async fn create_order(&self, request: &PlaceOrderRequest) -> Result<PlacedOrder, GatewayError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.orders.insert(id.clone(), request.clone());
        Ok(PlacedOrder {
            id,
            status: request.status,
            estimated_delivery_time: request.estimated_delivery_time,
        })
    }
}
