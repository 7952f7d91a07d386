//! UDP and TCP serving loops.
//!
//! Both transports bind the same address. Each inbound message is handed to
//! its own handler task so a slow upstream never stalls the receive loops.
//! TCP messages are framed with the RFC 1035 two-byte length prefix.

use crate::dns::handler::{Protocol, RequestHandler};
use anyhow::Context;
use socket2::{Domain, Protocol as SocketProtocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, error, info, warn};

/// Largest inbound datagram accepted; matches the payload size we advertise
/// upstream.
const MAX_DATAGRAM_SIZE: usize = 4096;

/// Binds UDP and TCP on `bind_addr` and serves until a listener dies, which
/// is fatal: the error propagates and the process exits nonzero.
pub async fn start_dns_server(bind_addr: SocketAddr, handler: RequestHandler) -> anyhow::Result<()> {
    let domain = if bind_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let udp_socket = Arc::new(create_udp_socket(domain, bind_addr)?);
    let tcp_listener = create_tcp_listener(domain, bind_addr)?;

    info!(bind_address = %bind_addr, "DNS server listening (UDP + TCP)");

    let handler = Arc::new(handler);
    tokio::try_join!(
        run_udp_worker(udp_socket, handler.clone()),
        run_tcp_listener(tcp_listener, handler),
    )?;
    Ok(())
}

async fn run_udp_worker(
    socket: Arc<UdpSocket>,
    handler: Arc<RequestHandler>,
) -> anyhow::Result<()> {
    let mut recv_buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (n, peer) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(error) => {
                error!(%error, "UDP recv error");
                continue;
            }
        };

        debug!(%peer, bytes = n, "UDP request");

        let handler = handler.clone();
        let socket = socket.clone();
        let message = recv_buf[..n].to_vec();
        tokio::spawn(async move {
            if let Some(response) = handler.handle(&message, Protocol::Udp).await {
                if let Err(error) = socket.send_to(&response, peer).await {
                    warn!(%peer, %error, "error writing UDP response");
                }
            }
        });
    }
}

async fn run_tcp_listener(
    listener: TcpListener,
    handler: Arc<RequestHandler>,
) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!(%peer, "TCP connection");
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Err(error) = serve_tcp_connection(stream, handler).await {
                        debug!(%peer, %error, "TCP connection ended");
                    }
                });
            }
            Err(error) => {
                error!(%error, "TCP accept error");
            }
        }
    }
}

/// Serves length-prefixed messages on one client connection until the peer
/// closes it.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    handler: Arc<RequestHandler>,
) -> io::Result<()> {
    loop {
        let mut len_buf = [0u8; 2];
        if let Err(error) = stream.read_exact(&mut len_buf).await {
            // EOF between messages is the normal way a client hangs up.
            return if error.kind() == io::ErrorKind::UnexpectedEof {
                Ok(())
            } else {
                Err(error)
            };
        }

        let message_len = u16::from_be_bytes(len_buf) as usize;
        let mut message = vec![0u8; message_len];
        stream.read_exact(&mut message).await?;

        if let Some(response) = handler.handle(&message, Protocol::Tcp).await {
            stream
                .write_all(&(response.len() as u16).to_be_bytes())
                .await?;
            stream.write_all(&response).await?;
            stream.flush().await?;
        }
    }
}

fn create_udp_socket(domain: Domain, addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(SocketProtocol::UDP))
        .context("create UDP socket")?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(8 * 1024 * 1024)?;
    socket.set_send_buffer_size(4 * 1024 * 1024)?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("bind UDP {addr}"))?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(SocketProtocol::TCP))
        .context("create TCP socket")?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("bind TCP {addr}"))?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
