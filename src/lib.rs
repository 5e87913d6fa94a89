pub mod api;
pub mod config;
pub mod deeplink;
pub mod models;
pub mod reflect;
pub mod render;
pub mod store;
