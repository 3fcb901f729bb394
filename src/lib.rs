pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod posts;
pub mod session;
pub mod storage;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
