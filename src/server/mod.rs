pub mod config;
pub mod configuration;
pub mod handlers;
pub mod services;
