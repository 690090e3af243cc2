pub mod fixtures;
pub mod stub_server;

use std::sync::Arc;
use std::time::Duration;

use mathgame_client::{ClientConfig, HttpScoringApi};

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use stub_server::{RecordedRequest, StubServer};

/// Config pointed at the stub, with delays short enough for real-time tests.
#[allow(dead_code)]
pub fn config_for(server: &StubServer) -> ClientConfig {
    ClientConfig {
        stats_retry_delay: Duration::from_millis(50),
        refresh_interval: Duration::from_millis(50),
        request_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }
    .with_base_url(server.base_url())
}

#[allow(dead_code)]
pub fn api_for(server: &StubServer) -> Arc<HttpScoringApi> {
    Arc::new(HttpScoringApi::new(&config_for(server)).unwrap())
}
