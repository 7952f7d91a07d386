pub mod logging;
pub mod server;
pub mod upstream;

pub use logging::LogLevel;
pub use server::ServerConfig;
pub use upstream::{parse_groups, UpstreamGroup};

/// Complete runtime configuration, assembled by the CLI from command-line
/// flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Upstream groups in fallback order.
    pub groups: Vec<UpstreamGroup>,
    pub log_level: LogLevel,
}
