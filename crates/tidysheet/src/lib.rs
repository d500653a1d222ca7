pub mod config;
pub mod http;
pub mod usage;

pub use config::ServiceConfig;
