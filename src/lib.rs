pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod forms;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod session;
pub mod state;
pub mod toast;
pub mod token_store;
pub mod ui;
pub mod views;
pub mod worker;
