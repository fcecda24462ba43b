//! cart-hex: hexagonal cart core (store, persistence, checkout) + inbound console

pub mod config;
pub mod errors;

pub mod application;

pub use cart_types::{domain, ports};

pub mod inbound; // line-oriented console adapter
