//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use header_gateway::config::GatewayConfig;
use header_gateway::http::HttpServer;
use header_gateway::lifecycle::Shutdown;

/// Start a mock upstream that echoes the request path as its body.
///
/// Every response carries the extra `headers` lines verbatim.
pub async fn start_mock_upstream(headers: &'static [&'static str]) -> SocketAddr {
    start_delayed_upstream(headers, Duration::ZERO).await
}

/// Like [`start_mock_upstream`], but each response is held back for `delay`.
pub async fn start_delayed_upstream(headers: &'static [&'static str], delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut read = 0;
                        while read < buf.len() {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => read += n,
                            }
                            if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }

                        let request = String::from_utf8_lossy(&buf[..read]);
                        let path = request
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        tokio::time::sleep(delay).await;

                        let mut extra = String::new();
                        for header in headers {
                            extra.push_str(header);
                            extra.push_str("\r\n");
                        }

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
                            path.len(),
                            extra,
                            path
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A gateway running in the background.
#[allow(dead_code)]
pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<GatewayConfig>,
}

/// Start the gateway in front of `upstream` on an ephemeral port.
pub async fn start_gateway(mut config: GatewayConfig, upstream: SocketAddr) -> RunningGateway {
    config.upstream.url = format!("http://{}", upstream);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningGateway {
        addr,
        shutdown,
        config_tx,
    }
}

/// A client that never pools or proxies connections.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
