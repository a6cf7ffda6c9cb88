use std::{path::Path, sync::Arc};

use reqwest::{Client, Url};
use torrent_parser::{model::Metainfo, parse_torrent_file};
use tracing::{debug, instrument};

use crate::{
    config::TrackerConfig,
    error::{AnnounceError, AnnounceResult},
    http,
    peer::ClientIdentity,
    random::{ThreadRngSource, TransactionIdSource},
    request::AnnounceRequest,
    udp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Udp,
}

impl Transport {
    /// `udp://` trackers speak BEP-15; every other scheme goes over HTTP.
    pub fn for_url(url: &Url) -> Self {
        if url.scheme() == "udp" {
            Transport::Udp
        } else {
            Transport::Http
        }
    }
}

/// Contacts the tracker named by a torrent's announce URL.
///
/// A client can be shared between concurrent announces. Each announce is a
/// single attempt: failures are returned as-is and never retried.
pub struct TrackerClient {
    http_client: Arc<Client>,
    config: TrackerConfig,
    transaction_ids: Arc<dyn TransactionIdSource>,
}

impl TrackerClient {
    pub fn new() -> AnnounceResult<Self> {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> AnnounceResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http_client = builder.build()?;

        Ok(TrackerClient {
            http_client: Arc::new(http_client),
            config,
            transaction_ids: Arc::new(ThreadRngSource),
        })
    }

    pub fn with_id_source(mut self, source: Arc<dyn TransactionIdSource>) -> Self {
        self.transaction_ids = source;
        self
    }

    /// Sends a `started` announce and returns the tracker's raw reply.
    pub async fn announce(
        &self,
        metainfo: &Metainfo,
        identity: &ClientIdentity,
    ) -> AnnounceResult<Vec<u8>> {
        let request = AnnounceRequest::started(metainfo, identity);
        self.send(metainfo.announce(), &request).await
    }

    pub async fn announce_torrent_file(
        &self,
        torrent_path: impl AsRef<Path>,
        identity: &ClientIdentity,
    ) -> AnnounceResult<Vec<u8>> {
        let metainfo = parse_torrent_file(torrent_path)?;
        self.announce(&metainfo, identity).await
    }

    /// Sends an arbitrary request to `announce_url`.
    #[instrument(skip(self, request), fields(info_hash = %request.info_hash))]
    pub async fn send(
        &self,
        announce_url: &str,
        request: &AnnounceRequest,
    ) -> AnnounceResult<Vec<u8>> {
        let url = Url::parse(announce_url)
            .map_err(|e| AnnounceError::invalid_url(announce_url, e.to_string()))?;

        let transport = Transport::for_url(&url);
        debug!(?transport, "announcing");

        let response = match transport {
            Transport::Udp => {
                udp::announce(
                    &url,
                    request,
                    self.config.udp_timeout,
                    self.transaction_ids.as_ref(),
                )
                .await?
            }
            Transport::Http => http::announce(&self.http_client, &url, request).await?,
        };

        debug!(len = response.len(), "tracker replied");
        Ok(response)
    }
}
