pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::{build_service, AppService};
pub use config::AppConfig;
pub use core::service::LocalityService;
pub use utils::error::{LocalityError, Result};
