pub mod cart_store;
pub mod checkout_service;
pub mod persister;
