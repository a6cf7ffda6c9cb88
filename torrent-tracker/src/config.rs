use std::time::Duration;

/// Tunables for [`TrackerClient`](crate::tracker::TrackerClient).
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Deadline for each of the two UDP round trips
    pub udp_timeout: Duration,
    /// Deadline for the whole HTTP request, body included
    pub http_timeout: Duration,
    pub user_agent: String,
    /// Honour `HTTP_PROXY`-style environment variables for HTTP trackers
    pub use_system_proxy: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            udp_timeout: Duration::from_secs(5),
            http_timeout: Duration::from_secs(10),
            user_agent: concat!("rusty-torrent/", env!("CARGO_PKG_VERSION")).to_string(),
            use_system_proxy: true,
        }
    }
}
