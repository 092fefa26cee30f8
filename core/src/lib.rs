pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod poller;
pub mod protocol;
pub mod store;
