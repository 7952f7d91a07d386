use clap::Parser;
use rally_dns_infrastructure::dns::forwarding::{GroupCascade, GroupRacer, UpstreamClient};
use rally_dns_infrastructure::dns::server;
use rally_dns_infrastructure::dns::{QueryCoordinator, RequestHandler};
use std::net::{Ipv4Addr, SocketAddr};
use tracing::info;

mod bootstrap;

#[derive(Parser)]
#[command(name = "rally-dns", version)]
#[command(about = "Forwarding DNS resolver that races upstream server groups")]
struct Cli {
    /// Address to listen on for DNS requests; bound on both UDP and TCP
    #[arg(long, default_value_t = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 53)))]
    listen_addr: SocketAddr,

    /// Upstream servers to forward requests to. Each occurrence forms one
    /// fallback group; comma-separate addresses inside an occurrence to race
    /// them. Order dictates precedence should more than one server respond
    #[arg(long = "fwd-to", value_name = "IP:PORT[,IP:PORT...]")]
    fwd_to: Vec<String>,

    /// Merge the addresses of every --fwd-to occurrence into a single group
    /// and race them all
    #[arg(long)]
    parallel: bool,

    /// Upstream read timeout in milliseconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Minimum log level to show: debug, info, warn, error or fatal
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Relay truncated upstream responses instead of treating them as
    /// failures
    #[arg(long)]
    allow_truncated: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::build_config(&cli)?;
    bootstrap::init_logging(config.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting rally-dns");
    for (position, group) in config.groups.iter().enumerate() {
        info!(group = position, servers = ?group.servers, "upstream group");
    }

    let client = UpstreamClient::new(config.server.read_timeout, config.server.allow_truncated);
    let cascade = GroupCascade::new(GroupRacer::new(client), config.groups);
    let coordinator = QueryCoordinator::spawn(cascade);
    let handler = RequestHandler::new(coordinator);

    server::start_dns_server(config.server.listen_addr, handler).await
}
