pub mod cart;
pub mod money;
pub mod order;
