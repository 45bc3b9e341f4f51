//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use netsuite_gateway::config::{GatewayConfig, NetSuiteConfig};
use netsuite_gateway::{HttpServer, Shutdown};

/// One request as the mock NetSuite received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub head: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    /// The SuiteQL text from the `{"q": ...}` body.
    pub fn query(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| v["q"].as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// A programmable NetSuite stand-in on a random local port.
pub struct MockNetSuite {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockNetSuite {
    /// Serve every request with `f`, which returns (status, body).
    pub async fn start<F, Fut>(f: F) -> Self
    where
        F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (u16, String)> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let f = Arc::new(f);

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let f = f.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    recorded.lock().unwrap().push(request.clone());

                    let (status, body) = f(request).await;
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(status),
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    /// Answer SuiteQL queries from fixed customer and contact lists.
    pub async fn with_records(customers: &[&str], contacts: &[&str]) -> Self {
        let customers: Vec<String> = customers.iter().map(|s| s.to_string()).collect();
        let contacts: Vec<String> = contacts.iter().map(|s| s.to_string()).collect();

        Self::start(move |request| {
            let query = request.query();
            let known = if query.contains("FROM Customer") {
                &customers
            } else {
                &contacts
            };
            let count = known
                .iter()
                .filter(|email| query.contains(&format!("'{}'", email)))
                .count();
            async move { (200, suiteql_body(count)) }
        })
        .await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/services/rest/query/v1", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn suiteql_body(count: usize) -> String {
    let items: Vec<_> = (0..count)
        .map(|i| serde_json::json!({ "entityid": format!("ENT-{}", i) }))
        .collect();
    serde_json::json!({
        "count": count,
        "hasMore": false,
        "items": items,
        "links": [],
        "offset": 0,
        "totalResults": count,
    })
    .to_string()
}

/// A local address with nothing listening on it.
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Valid configuration pointing at `base_url`, with no API keys.
pub fn gateway_config(base_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.netsuite = NetSuiteConfig {
        base_url: base_url.to_string(),
        consumer_key: "consumer-key".into(),
        consumer_secret: "consumer-secret".into(),
        access_token: "access-token".into(),
        token_secret: "token-secret".into(),
        realm: "1234567".into(),
        timeout_secs: 5,
        ..NetSuiteConfig::default()
    };
    config
}

/// A running gateway. Dropping it leaves the server task to be torn down
/// with the test runtime; call `stop` to exercise graceful shutdown.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestGateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer::new(config).unwrap();
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

        wait_for_port(addr).await;
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("gateway should stop")
            .unwrap()
            .unwrap();
    }
}

async fn wait_for_port(addr: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("gateway did not start on {}", addr);
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();
    Some(RecordedRequest { head, body })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
