//! UDP tracker announce ([BEP-15]).
//!
//! One announce is a two-round exchange over a single socket: a connect
//! round that obtains a connection id, then the announce itself. Each round
//! draws a fresh transaction id and waits for exactly one reply under a hard
//! deadline. Nothing survives the call; the next announce connects again.
//!
//! [BEP-15]: http://bittorrent.org/beps/bep_0015.html

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use byteorder::{BigEndian, ByteOrder};
use reqwest::Url;
use tokio::{
    net::{lookup_host, UdpSocket},
    time::timeout,
};
use tracing::{debug, trace, warn};

use crate::{
    error::{AnnounceError, AnnouncePhase, AnnounceResult},
    random::TransactionIdSource,
    request::AnnounceRequest,
};

const PROTOCOL_ID: u64 = 0x41727101980;
const ACTION_CONNECT: u32 = 0;
const ACTION_ANNOUNCE: u32 = 1;
const ACTION_ERROR: u32 = 3;

const CONNECT_REQUEST_LEN: usize = 16;
const CONNECT_RESPONSE_LEN: usize = 16;
const ANNOUNCE_REQUEST_LEN: usize = 98;
const ANNOUNCE_RESPONSE_MIN_LEN: usize = 8;
const RECV_BUFFER_LEN: usize = 2048;

const NUM_WANT_DEFAULT: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Init,
    Connecting,
    Connected { connection_id: u64 },
    Announcing,
    Done,
    Failed,
}

pub(crate) struct UdpSession<'a> {
    socket: UdpSocket,
    timeout: Duration,
    ids: &'a dyn TransactionIdSource,
    state: SessionState,
}

/// Announces to the `udp://` tracker and returns its raw announce reply.
pub(crate) async fn announce(
    tracker: &Url,
    request: &AnnounceRequest,
    round_timeout: Duration,
    ids: &dyn TransactionIdSource,
) -> AnnounceResult<Vec<u8>> {
    let addr = resolve(tracker, round_timeout).await?;
    let mut session = UdpSession::open(addr, round_timeout, ids).await?;
    session.run(request).await
}

async fn resolve(tracker: &Url, deadline: Duration) -> AnnounceResult<SocketAddr> {
    let host = tracker
        .host_str()
        .ok_or_else(|| AnnounceError::invalid_url(tracker.as_str(), "missing host"))?;
    let port = tracker
        .port()
        .ok_or_else(|| AnnounceError::invalid_url(tracker.as_str(), "missing port"))?;

    let mut addrs = match timeout(deadline, lookup_host(format!("{}:{}", host, port))).await {
        Ok(Ok(addrs)) => addrs,
        Ok(Err(e)) => return Err(AnnounceError::io(AnnouncePhase::Resolve, e)),
        Err(_) => return Err(AnnounceError::UdpTimeout(AnnouncePhase::Resolve)),
    };

    addrs.next().ok_or_else(|| {
        AnnounceError::io(
            AnnouncePhase::Resolve,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address found for {}", host),
            ),
        )
    })
}

impl<'a> UdpSession<'a> {
    pub(crate) async fn open(
        addr: SocketAddr,
        round_timeout: Duration,
        ids: &'a dyn TransactionIdSource,
    ) -> AnnounceResult<Self> {
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(|e| AnnounceError::io(AnnouncePhase::Bind, e))?;
        // only accept datagrams from the tracker itself
        socket
            .connect(addr)
            .await
            .map_err(|e| AnnounceError::io(AnnouncePhase::Bind, e))?;

        Ok(UdpSession {
            socket,
            timeout: round_timeout,
            ids,
            state: SessionState::Init,
        })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) async fn run(&mut self, request: &AnnounceRequest) -> AnnounceResult<Vec<u8>> {
        let result = self.handshake(request).await;
        if result.is_err() {
            self.transition(SessionState::Failed);
        }
        result
    }

    async fn handshake(&mut self, request: &AnnounceRequest) -> AnnounceResult<Vec<u8>> {
        let connection_id = self.connect().await?;
        let response = self.announce(connection_id, request).await?;
        self.transition(SessionState::Done);
        Ok(response)
    }

    async fn connect(&mut self) -> AnnounceResult<u64> {
        self.transition(SessionState::Connecting);

        let transaction_id = self.ids.next_transaction_id();
        let packet = encode_connect_request(transaction_id);
        let response = self.exchange(&packet, AnnouncePhase::UdpConnect).await?;
        let connection_id = parse_connect_response(&response, transaction_id)?;

        self.transition(SessionState::Connected { connection_id });
        Ok(connection_id)
    }

    async fn announce(
        &mut self,
        connection_id: u64,
        request: &AnnounceRequest,
    ) -> AnnounceResult<Vec<u8>> {
        self.transition(SessionState::Announcing);

        let transaction_id = self.ids.next_transaction_id();
        let packet = encode_announce_request(connection_id, transaction_id, request);
        let response = self.exchange(&packet, AnnouncePhase::UdpAnnounce).await?;
        check_announce_response(&response, transaction_id)?;

        Ok(response)
    }

    async fn exchange(&self, packet: &[u8], phase: AnnouncePhase) -> AnnounceResult<Vec<u8>> {
        self.socket
            .send(packet)
            .await
            .map_err(|e| AnnounceError::io(phase, e))?;
        trace!(len = packet.len(), %phase, "sent datagram");

        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        let len = match timeout(self.timeout, self.socket.recv(&mut buf)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => return Err(AnnounceError::io(phase, e)),
            Err(_) => return Err(AnnounceError::UdpTimeout(phase)),
        };
        trace!(len, %phase, "received datagram");

        buf.truncate(len);
        Ok(buf)
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "udp tracker session");
        self.state = next;
    }
}

pub(crate) fn encode_connect_request(transaction_id: u32) -> [u8; CONNECT_REQUEST_LEN] {
    let mut packet = [0u8; CONNECT_REQUEST_LEN];
    BigEndian::write_u64(&mut packet[0..8], PROTOCOL_ID);
    BigEndian::write_u32(&mut packet[8..12], ACTION_CONNECT);
    BigEndian::write_u32(&mut packet[12..16], transaction_id);
    packet
}

/// Validates a connect reply and returns the connection id it grants.
pub(crate) fn parse_connect_response(response: &[u8], transaction_id: u32) -> AnnounceResult<u64> {
    if response.len() < CONNECT_RESPONSE_LEN {
        return Err(AnnounceError::UdpHandshakeFailed(format!(
            "connect response too short: {} bytes",
            response.len()
        )));
    }

    let action = BigEndian::read_u32(&response[0..4]);
    if action != ACTION_CONNECT {
        return Err(AnnounceError::UdpHandshakeFailed(format!(
            "unexpected action {} in connect response",
            action
        )));
    }

    let response_tid = BigEndian::read_u32(&response[4..8]);
    if response_tid != transaction_id {
        return Err(AnnounceError::UdpHandshakeFailed(format!(
            "transaction id mismatch: sent {:#010x}, got {:#010x}",
            transaction_id, response_tid
        )));
    }

    Ok(BigEndian::read_u64(&response[8..16]))
}

pub(crate) fn encode_announce_request(
    connection_id: u64,
    transaction_id: u32,
    request: &AnnounceRequest,
) -> [u8; ANNOUNCE_REQUEST_LEN] {
    let mut packet = [0u8; ANNOUNCE_REQUEST_LEN];
    BigEndian::write_u64(&mut packet[0..8], connection_id);
    BigEndian::write_u32(&mut packet[8..12], ACTION_ANNOUNCE);
    BigEndian::write_u32(&mut packet[12..16], transaction_id);
    packet[16..36].copy_from_slice(request.info_hash.as_bytes());
    packet[36..56].copy_from_slice(request.peer_id.as_bytes());
    BigEndian::write_u64(&mut packet[56..64], request.downloaded);
    BigEndian::write_u64(&mut packet[64..72], request.left);
    BigEndian::write_u64(&mut packet[72..80], request.uploaded);
    BigEndian::write_u32(&mut packet[80..84], request.event.as_udp_id());
    // ip 0: tracker uses the datagram's source address
    BigEndian::write_u32(&mut packet[84..88], 0);
    // key
    BigEndian::write_u32(&mut packet[88..92], 0);
    BigEndian::write_i32(&mut packet[92..96], NUM_WANT_DEFAULT);
    BigEndian::write_u16(&mut packet[96..98], request.port);
    packet
}

/// Rejects short and error replies; anything else goes back to the caller
/// untouched.
///
/// The reply's action and transaction id are only logged when they differ
/// from what was sent. A stray 16-byte connect reply arriving in the announce
/// round is therefore returned as the announce reply.
pub(crate) fn check_announce_response(response: &[u8], transaction_id: u32) -> AnnounceResult<()> {
    if response.len() < ANNOUNCE_RESPONSE_MIN_LEN {
        return Err(AnnounceError::TruncatedAnnounceResponse(response.len()));
    }

    let action = BigEndian::read_u32(&response[0..4]);
    if action == ACTION_ERROR {
        let message = String::from_utf8_lossy(&response[ANNOUNCE_RESPONSE_MIN_LEN..]);
        return Err(AnnounceError::TrackerRejected(message.into_owned()));
    }

    let response_tid = BigEndian::read_u32(&response[4..8]);
    if action != ACTION_ANNOUNCE || response_tid != transaction_id {
        warn!(action, response_tid, transaction_id, "unexpected announce response header");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use torrent_parser::InfoHash;

    use super::*;
    use crate::{peer::PeerId, request::AnnounceEvent};

    struct FixedIds(Mutex<Vec<u32>>);

    impl FixedIds {
        fn new(ids: &[u32]) -> Self {
            let mut ids = ids.to_vec();
            ids.reverse();
            FixedIds(Mutex::new(ids))
        }
    }

    impl TransactionIdSource for FixedIds {
        fn next_transaction_id(&self) -> u32 {
            self.0.lock().unwrap().pop().unwrap()
        }
    }

    fn request() -> AnnounceRequest {
        AnnounceRequest {
            info_hash: InfoHash::from_bytes([0xaa; 20]),
            peer_id: PeerId::try_from("-RT0001-abcdefghijkl").unwrap(),
            port: 6881,
            uploaded: 0,
            downloaded: 0,
            left: 0x0102_0304,
            event: AnnounceEvent::Started,
        }
    }

    fn connect_response(action: u32, transaction_id: u32, connection_id: u64) -> Vec<u8> {
        let mut buf = vec![0u8; 16];
        BigEndian::write_u32(&mut buf[0..4], action);
        BigEndian::write_u32(&mut buf[4..8], transaction_id);
        BigEndian::write_u64(&mut buf[8..16], connection_id);
        buf
    }

    #[test]
    fn test_connect_request_bytes() {
        let packet = encode_connect_request(0xdead_beef);
        assert_eq!(
            packet,
            [
                0x00, 0x00, 0x04, 0x17, 0x27, 0x10, 0x19, 0x80, // protocol id
                0x00, 0x00, 0x00, 0x00, // connect
                0xde, 0xad, 0xbe, 0xef, // transaction id
            ]
        );
    }

    #[test]
    fn test_connect_response_accepted() {
        let response = connect_response(ACTION_CONNECT, 7, 0x1122_3344_5566_7788);
        assert_eq!(
            parse_connect_response(&response, 7).unwrap(),
            0x1122_3344_5566_7788
        );
    }

    #[test]
    fn test_connect_response_transaction_mismatch() {
        let response = connect_response(ACTION_CONNECT, 8, 1);
        assert!(matches!(
            parse_connect_response(&response, 7),
            Err(AnnounceError::UdpHandshakeFailed(_))
        ));
    }

    #[test]
    fn test_connect_response_wrong_action() {
        let response = connect_response(ACTION_ANNOUNCE, 7, 1);
        assert!(matches!(
            parse_connect_response(&response, 7),
            Err(AnnounceError::UdpHandshakeFailed(_))
        ));
    }

    #[test]
    fn test_connect_response_truncated() {
        let response = connect_response(ACTION_CONNECT, 7, 1);
        for len in 0..CONNECT_RESPONSE_LEN {
            assert!(matches!(
                parse_connect_response(&response[..len], 7),
                Err(AnnounceError::UdpHandshakeFailed(_))
            ));
        }
    }

    #[test]
    fn test_announce_request_layout() {
        let packet = encode_announce_request(0x0102_0304_0506_0708, 0x0a0b_0c0d, &request());

        assert_eq!(packet.len(), 98);
        assert_eq!(&packet[0..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&packet[8..12], &[0, 0, 0, 1]);
        assert_eq!(&packet[12..16], &[0x0a, 0x0b, 0x0c, 0x0d]);
        assert_eq!(&packet[16..36], &[0xaa; 20]);
        assert_eq!(&packet[36..56], b"-RT0001-abcdefghijkl");
        assert_eq!(&packet[56..64], &[0; 8]);
        assert_eq!(&packet[64..72], &[0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(&packet[72..80], &[0; 8]);
        assert_eq!(&packet[80..84], &[0, 0, 0, 2]);
        assert_eq!(&packet[84..92], &[0; 8]);
        assert_eq!(&packet[92..96], &[0xff; 4]);
        assert_eq!(&packet[96..98], &[0x1a, 0xe1]);
    }

    #[test]
    fn test_announce_response_error_message() {
        let mut response = vec![0, 0, 0, 3, 0, 0, 0, 9];
        response.extend_from_slice(b"torrent not registered");

        match check_announce_response(&response, 9) {
            Err(AnnounceError::TrackerRejected(message)) => {
                assert_eq!(message, "torrent not registered")
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_announce_response_truncated() {
        let response = [0u8, 0, 0, 1, 0, 0, 0];
        for len in 0..ANNOUNCE_RESPONSE_MIN_LEN {
            assert!(matches!(
                check_announce_response(&response[..len], 0),
                Err(AnnounceError::TruncatedAnnounceResponse(n)) if n == len
            ));
        }
    }

    #[test]
    fn test_announce_response_unexpected_header_passes() {
        let stray_connect = connect_response(ACTION_CONNECT, 11, 99);
        assert!(check_announce_response(&stray_connect, 12).is_ok());
    }

    #[tokio::test]
    async fn test_resolve_loopback() {
        let url = Url::parse("udp://127.0.0.1:6969/announce").unwrap();
        let addr = resolve(&url, Duration::from_secs(1)).await.unwrap();
        assert_eq!(addr, SocketAddr::from((Ipv4Addr::LOCALHOST, 6969)));
    }

    #[test]
    fn test_announce_response_success() {
        let response = [0u8, 0, 0, 1, 0, 0, 0, 9, 0, 0, 0x07, 0x08];
        assert!(check_announce_response(&response, 9).is_ok());
    }

    #[tokio::test]
    async fn test_session_reaches_done() {
        let tracker = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = tracker.local_addr().unwrap();
        let ids = FixedIds::new(&[11, 12]);

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let (_, from) = tracker.recv_from(&mut buf).await.unwrap();
            tracker
                .send_to(&connect_response(ACTION_CONNECT, 11, 99), from)
                .await
                .unwrap();

            let (len, from) = tracker.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, ANNOUNCE_REQUEST_LEN);
            assert_eq!(BigEndian::read_u64(&buf[0..8]), 99);
            assert_eq!(BigEndian::read_u32(&buf[12..16]), 12);
            tracker
                .send_to(&[0, 0, 0, 1, 0, 0, 0, 12], from)
                .await
                .unwrap();
        });

        let mut session = UdpSession::open(addr, Duration::from_secs(5), &ids)
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Init);

        let response = session.run(&request()).await.unwrap();
        server.await.unwrap();

        assert_eq!(response, vec![0, 0, 0, 1, 0, 0, 0, 12]);
        assert_eq!(session.state(), SessionState::Done);
    }

    #[tokio::test]
    async fn test_session_fails_on_forged_reply() {
        let tracker = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = tracker.local_addr().unwrap();
        let ids = FixedIds::new(&[21, 22]);

        let server = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (_, from) = tracker.recv_from(&mut buf).await.unwrap();
            tracker
                .send_to(&connect_response(ACTION_CONNECT, 20, 99), from)
                .await
                .unwrap();
        });

        let mut session = UdpSession::open(addr, Duration::from_secs(5), &ids)
            .await
            .unwrap();
        let result = session.run(&request()).await;
        server.await.unwrap();

        assert!(matches!(result, Err(AnnounceError::UdpHandshakeFailed(_))));
        assert_eq!(session.state(), SessionState::Failed);
    }
}
