//! Startup wiring: flag translation and logging.

use crate::Cli;
use anyhow::Context;
use rally_dns_domain::config::{parse_groups, Config, LogLevel, ServerConfig};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let log_level: LogLevel = cli.log_level.parse().context("invalid --log-level")?;
    let groups = parse_groups(&cli.fwd_to, cli.parallel).context("invalid --fwd-to")?;

    Ok(Config {
        server: ServerConfig {
            listen_addr: cli.listen_addr,
            read_timeout: Duration::from_millis(cli.timeout),
            allow_truncated: cli.allow_truncated,
        },
        groups,
        log_level,
    })
}

/// Initializes the global tracing subscriber. `RUST_LOG` wins over the
/// command-line level when set.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
