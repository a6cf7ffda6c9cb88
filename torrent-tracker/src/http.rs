use std::fmt::Write as _;

use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::{
    error::{AnnounceError, AnnouncePhase, AnnounceResult},
    request::AnnounceRequest,
};

/// Sends one GET announce and returns the body as received.
///
/// A non-2xx status is not an error here; the tracker's body is handed back
/// for the caller to interpret.
pub(crate) async fn announce(
    client: &Client,
    tracker: &Url,
    request: &AnnounceRequest,
) -> AnnounceResult<Vec<u8>> {
    let url = announce_url(tracker, request);
    debug!(%url, "sending http announce");

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| AnnounceError::io(AnnouncePhase::HttpRequest, std::io::Error::other(e)))?;

    let status = resp.status();
    if !status.is_success() {
        warn!(%status, "tracker answered with non-success status");
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| AnnounceError::io(AnnouncePhase::HttpBody, std::io::Error::other(e)))?;
    debug!(len = body.len(), %status, "http announce finished");

    Ok(body.to_vec())
}

/// Appends the announce parameters to the tracker URL, keeping any query the
/// tracker URL already has.
pub(crate) fn announce_url(tracker: &Url, request: &AnnounceRequest) -> Url {
    let mut query = format!(
        "info_hash={}&peer_id={}&port={}&uploaded={}&downloaded={}&left={}&compact=1",
        escape_bytes(request.info_hash.as_bytes()),
        escape_bytes(request.peer_id.as_bytes()),
        request.port,
        request.uploaded,
        request.downloaded,
        request.left,
    );

    let event = request.event.as_str();
    if !event.is_empty() {
        query.push_str("&event=");
        query.push_str(event);
    }

    let mut url = tracker.clone();
    match tracker.query() {
        Some(existing) if !existing.is_empty() => {
            url.set_query(Some(&format!("{}&{}", existing, query)))
        }
        _ => url.set_query(Some(&query)),
    }
    url
}

/// Escapes every byte as `%XX`, unreserved characters included.
pub(crate) fn escape_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 3), |mut out, b| {
            let _ = write!(out, "%{:02X}", b);
            out
        })
}
