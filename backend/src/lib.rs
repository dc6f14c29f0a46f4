pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod store;
