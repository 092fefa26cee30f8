pub mod factory;
pub mod store;
