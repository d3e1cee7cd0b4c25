pub mod auth_client;
pub mod backend_http;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod task_gateway;
