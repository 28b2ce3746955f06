pub mod breaker;
pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod output;
pub mod service;
pub mod validation;
