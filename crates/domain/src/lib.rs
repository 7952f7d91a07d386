pub mod config;
pub mod errors;

pub use config::{Config, LogLevel, ServerConfig, UpstreamGroup};
pub use errors::DomainError;
