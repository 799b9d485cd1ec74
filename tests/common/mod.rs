//! Common test utilities shared across all integration test files.
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! Every test runs against its own `wiremock` server; nothing here talks to
//! a real API.

use contract_sdk::{Client, ClientBuilder, RetryPolicy};
use std::future::Future;
use std::time::Duration;
use wiremock::MockServer;

/// Safety net so a hung request fails the test instead of stalling the suite.
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default retry budget with millisecond backoff, so retry tests stay fast.
#[allow(dead_code)]
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries)
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

/// Builder pointed at `server` with fast retries.
#[allow(dead_code)]
pub fn builder_for(server: &MockServer) -> ClientBuilder {
    Client::builder(server.uri()).retry_policy(fast_retry(3))
}

/// Client without credentials.
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> Client {
    builder_for(server).build().expect("client should build")
}

/// Client holding the given token pair.
#[allow(dead_code)]
pub fn authed_client(server: &MockServer, access: &str, refresh: &str) -> Client {
    builder_for(server)
        .access_token(access)
        .refresh_token(refresh)
        .build()
        .expect("client should build")
}

/// Number of requests the server received for `path`.
#[allow(dead_code)]
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == path)
        .count()
}

/// An address on which nothing is listening.
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Deterministic, non-repeating-per-KiB test payload.
#[allow(dead_code)]
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 1024) % 251) as u8).collect()
}

/// Wraps a future with a timeout, panicking if the timeout is exceeded.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .unwrap_or_else(|_| panic!("Test timed out after {:?}", duration))
}
