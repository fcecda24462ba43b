pub mod cart_repository;
pub mod order_gateway;
