//! Loopback tunnel entry
//!
//! [`DirectEntry`] implements the [`TunnelEntry`] seam as a plain HTTP
//! CONNECT proxy on the advertised port: traffic goes straight to the
//! requested upstream instead of through relays. It serves as the
//! baseline entry for local measurement runs and as the concrete entry
//! in tests; relay-backed entries implement the same trait outside this
//! crate.

use crate::error::{AppError, Result};
use crate::tunnel::{EntryConfig, Service, ServiceInfo, TunnelEntry};
use crate::wallet::Wallet;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Upper bound on a proxied request head
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// Local CONNECT-proxy implementation of the tunnel entry seam
pub struct DirectEntry {
    service: Service,
    info: ServiceInfo,
    wallet: Wallet,
    dial_timeout: Duration,
    port: u16,
    connected_tx: watch::Sender<bool>,
    shutdown_tx: watch::Sender<bool>,
}

impl DirectEntry {
    /// Build an entry from a validated service/config set.
    ///
    /// The service must be registered in `config.services` under its own
    /// name; the first advertised TCP port becomes the listen port.
    pub fn new(
        service: Service,
        info: ServiceInfo,
        wallet: Wallet,
        config: EntryConfig,
    ) -> Result<Self> {
        service.validate()?;
        info.validate()?;
        if !config.services.contains_key(&service.name) {
            return Err(AppError::config(format!(
                "service '{}' is not registered in the entry configuration",
                service.name
            )));
        }
        let port = service.tcp[0];
        let (connected_tx, _) = watch::channel(false);
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            service,
            info,
            wallet,
            dial_timeout: config.dial_timeout,
            port,
            connected_tx,
            shutdown_tx,
        })
    }

    /// Advertised listen port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Name of the served service
    pub fn service_name(&self) -> &str {
        &self.service.name
    }
}

#[async_trait]
impl TunnelEntry for DirectEntry {
    async fn start(&self) -> Result<()> {
        let mut shutdown = self.shutdown_tx.subscribe();
        if *shutdown.borrow() {
            return Ok(());
        }

        let addr = SocketAddr::new(self.info.listen_ip, self.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::network(format!("failed to bind entry port {}: {}", addr, e)))?;

        self.connected_tx.send_replace(true);

        loop {
            tokio::select! {
                _ = shutdown.wait_for(|closed| *closed) => return Ok(()),
                accepted = listener.accept() => {
                    let (stream, _peer) = accepted
                        .map_err(|e| AppError::network(format!("accept failed: {}", e)))?;
                    let dial_timeout = self.dial_timeout;
                    let mut conn_shutdown = self.shutdown_tx.subscribe();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = conn_shutdown.wait_for(|closed| *closed) => {}
                            _ = serve_connect(stream, dial_timeout) => {}
                        }
                    });
                }
            }
        }
    }

    fn connect_signal(&self) -> watch::Receiver<bool> {
        self.connected_tx.subscribe()
    }

    async fn close(&self) {
        self.shutdown_tx.send_replace(true);
        self.connected_tx.send_replace(false);
    }

    fn identity(&self) -> &str {
        self.wallet.address()
    }
}

/// Handle one proxied client connection: CONNECT handshake, then a
/// bidirectional byte copy to the requested upstream.
async fn serve_connect(mut client: TcpStream, dial_timeout: Duration) -> Result<()> {
    let head = read_request_head(&mut client).await?;
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    if !method.eq_ignore_ascii_case("CONNECT") {
        let _ = client
            .write_all(b"HTTP/1.1 405 Method Not Allowed\r\n\r\n")
            .await;
        return Err(AppError::network(format!(
            "unsupported proxy method '{}'",
            method
        )));
    }

    let mut upstream = match tokio::time::timeout(dial_timeout, TcpStream::connect(target)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            let _ = client.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
            return Err(AppError::network(format!(
                "upstream dial to '{}' failed: {}",
                target, e
            )));
        }
        Err(_) => {
            let _ = client
                .write_all(b"HTTP/1.1 504 Gateway Timeout\r\n\r\n")
                .await;
            return Err(AppError::network(format!(
                "upstream dial to '{}' timed out",
                target
            )));
        }
    };

    client
        .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
        .await
        .map_err(|e| AppError::network(format!("proxy handshake write failed: {}", e)))?;

    let _ = tokio::io::copy_bidirectional(&mut client, &mut upstream).await;
    Ok(())
}

/// Read the raw request head up to the blank line
async fn read_request_head(stream: &mut TcpStream) -> Result<String> {
    let mut head = Vec::with_capacity(512);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| AppError::network(format!("proxy request read failed: {}", e)))?;
        if n == 0 {
            return Err(AppError::network("client closed before sending a request"));
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
        if head.len() > MAX_REQUEST_HEAD {
            let _ = stream
                .write_all(b"HTTP/1.1 431 Request Header Fields Too Large\r\n\r\n")
                .await;
            return Err(AppError::network("proxy request head too large"));
        }
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}
