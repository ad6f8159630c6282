//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use body_override_proxy::modifier::{ModifierChain, Registry};
use body_override_proxy::{HttpServer, ProxyConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Body returned by the mock backend.
pub const UPSTREAM_BODY: &str = "upstream payload";

/// Start a mock backend that answers every request with a gzip-labelled
/// JSON response. Returns its address and a hit counter.
pub async fn start_mock_backend() -> (SocketAddr, Arc<AtomicU32>) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Encoding: gzip\r\nX-Upstream: mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        UPSTREAM_BODY.len(),
        UPSTREAM_BODY
    );
    start_backend(response).await
}

/// Same as [`start_mock_backend`] but the body is sent with
/// `Transfer-Encoding: chunked`.
#[allow(dead_code)]
pub async fn start_chunked_backend() -> (SocketAddr, Arc<AtomicU32>) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Encoding: gzip\r\nX-Upstream: mock\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n{}\r\n0\r\n\r\n",
        UPSTREAM_BODY.len(),
        UPSTREAM_BODY
    );
    start_backend(response).await
}

async fn start_backend(response: String) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let response = Arc::new(response);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        counter.fetch_add(1, Ordering::SeqCst);

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A proxy running in the background until the handle is dropped.
pub struct ProxyHandle {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

/// Start the proxy with `upstream` and the chain described by `modifiers`.
pub async fn start_proxy(upstream: Option<SocketAddr>, modifiers: &str) -> ProxyHandle {
    let chain = ModifierChain::from_json(modifiers.as_bytes(), &Registry::with_builtin()).unwrap();

    let mut config = ProxyConfig::default();
    config.upstream.address = upstream.map(|a| a.to_string());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let (tx, rx) = oneshot::channel::<()>();
    let server = HttpServer::new(config, chain);
    tokio::spawn(async move {
        let _ = server
            .run_until(listener, async move {
                let _ = rx.await;
            })
            .await;
    });

    ProxyHandle {
        addr,
        _shutdown: tx,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
