use std::net::SocketAddr;

use axum::{Extension, Router, routing::get};
use client_ip::{ClientIp, ClientIpLayer, TrustedProxies};
use config::Config;
use logforth::{append::Stderr, filter::EnvFilter};
use tokio::net::TcpListener;

#[ctor::ctor]
fn init_logger() {
    logforth::builder()
        .dispatch(|d| d.filter(EnvFilter::from_default_env()).append(Stderr::default()))
        .apply();
}

/// Test server running the client IP layer behind a real socket.
pub struct TestServer {
    pub client: TestClient,
}

impl TestServer {
    /// Parses the TOML configuration and serves a probe route that
    /// echoes back the resolved client IP.
    pub async fn start(config: &str) -> Self {
        let config: Config = toml::from_str(config).expect("invalid test configuration");

        let trusted_proxies =
            TrustedProxies::from_config(&config.client_ip).expect("invalid trusted hosts in test configuration");

        let app = Router::new()
            .route("/ip", get(client_ip))
            .layer(ClientIpLayer::new(trusted_proxies));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test server");

        let address = listener.local_addr().expect("listener has no local address");

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .expect("test server exited");
        });

        log::debug!("test server listening on {address}");

        Self {
            client: TestClient::new(format!("http://{address}")),
        }
    }
}

async fn client_ip(Extension(ClientIp(ip)): Extension<ClientIp>) -> String {
    ip
}

/// Thin HTTP client pinned to the test server's base URL.
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Send a GET request to the given path
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap()
    }

    /// Create a request with the given method and path
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, format!("{}{path}", self.base_url))
    }
}
