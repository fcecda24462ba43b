use cart_types::domain::cart::CartError;
use cart_types::domain::money::MoneyError;
use cart_types::ports::order_gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order backend failed: {0}")]
    Upstream(#[from] GatewayError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<MoneyError> for AppError {
    fn from(e: MoneyError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl AppError {
    /// Message suitable for showing to the person at the keyboard.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest(m) => m.clone(),
            AppError::EmptyCart => "your cart is empty".into(),
            AppError::Upstream(_) => "failed to place order, please try again".into(),
            AppError::Internal(_) => "internal error".into(),
        }
    }
}
