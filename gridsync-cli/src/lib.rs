//! CLI library for testing purposes

pub mod api;
pub mod config;
pub mod export;
pub mod import;
pub mod logging;
pub mod urls;

pub use api::{ApiClient, ApiResponse, GridApi};
pub use config::{Settings, SetupConfig, load_script_config, load_setup_config};
pub use export::run_export;
pub use import::run_import;
