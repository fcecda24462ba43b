//! cart-types: cart domain model and the ports its adapters implement

pub mod domain;
pub mod ports;
