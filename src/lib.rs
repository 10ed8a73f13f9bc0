pub mod config;
pub mod fake_service;
pub mod http_client;
pub mod names;
pub mod ratings_api;
pub mod state;
pub mod worker;
