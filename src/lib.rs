pub mod api;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod ui;

pub use api::{CatalogApi, HttpCatalogClient};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
