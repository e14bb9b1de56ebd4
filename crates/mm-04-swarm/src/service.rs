//! # Swarm Service
//!
//! Owns the TCP side of the node: the accept loop, outbound dials, and one
//! reader plus one writer task per connection.
//!
//! ## Connection lifecycle
//!
//! 1. Handshake under `handshake_timeout` (challenge, hello, verify).
//! 2. `PeerRegistry::admit` atomically checks jail, duplicates and capacity.
//!    A refused peer is closed without any registry change.
//! 3. Reader: rate limit, decode, hand gossip to the engine on the blocking
//!    pool, answer pings. Any strike that lands the peer in jail ends the
//!    connection.
//! 4. Writer: drains the bounded outbound queue; a write exceeding
//!    `write_timeout` is a transport failure and closes the connection.
//! 5. Teardown removes the table entry and marks the record disconnected,
//!    both guarded by the connection id so a newer connection is untouched.

use crate::connections::{ConnectionDirection, ConnectionHandle, ConnectionTable};
use crate::domain::config::SwarmConfig;
use crate::domain::errors::SwarmError;
use crate::domain::frames::WireFrame;
use crate::domain::handshake;
use crate::domain::rate_limiter::RateLimiter;
use crate::domain::topic::{network_topic, PROTOCOL_VERSION};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use mm_01_signatures::SignatureApi;
use mm_02_peer_registry::{PeerRegistry, RegistryError};
use mm_03_gossip::{Disposition, GossipApi, RejectReason};
use parking_lot::RwLock;
use shared_types::{ConnectionId, PeerId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;
use tokio_util::codec::{Framed, LengthDelimitedCodec, LengthDelimitedCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type Transport = Framed<TcpStream, LengthDelimitedCodec>;

/// Membership manager.
///
/// Always handled through an `Arc`: connection tasks keep the swarm alive
/// until they finish.
pub struct Swarm {
    config: SwarmConfig,
    topic: String,
    registry: Arc<PeerRegistry>,
    connections: Arc<ConnectionTable>,
    gossip: Arc<dyn GossipApi>,
    signatures: Arc<dyn SignatureApi>,
    local_addr: RwLock<Option<SocketAddr>>,
    handshake_slots: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl Swarm {
    pub fn new(
        config: SwarmConfig,
        registry: Arc<PeerRegistry>,
        connections: Arc<ConnectionTable>,
        gossip: Arc<dyn GossipApi>,
        signatures: Arc<dyn SignatureApi>,
    ) -> Arc<Self> {
        Self::with_topic(
            config,
            network_topic(PROTOCOL_VERSION),
            registry,
            connections,
            gossip,
            signatures,
        )
    }

    /// Like [`Swarm::new`] but on an explicit network topic.
    pub fn with_topic(
        config: SwarmConfig,
        topic: String,
        registry: Arc<PeerRegistry>,
        connections: Arc<ConnectionTable>,
        gossip: Arc<dyn GossipApi>,
        signatures: Arc<dyn SignatureApi>,
    ) -> Arc<Self> {
        let handshake_slots = Arc::new(Semaphore::new(config.max_pending_handshakes.max(1)));
        Arc::new(Self {
            config,
            topic,
            registry,
            connections,
            gossip,
            signatures,
            local_addr: RwLock::new(None),
            handshake_slots,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Bound listen address, once [`Swarm::listen`] has succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub fn connected_peers(&self) -> Vec<PeerId> {
        self.connections.peers()
    }

    pub fn peer_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_connected(&self, peer: &PeerId) -> bool {
        self.connections.contains(peer)
    }

    /// Close the connection to `peer`, if any.
    pub fn disconnect(&self, peer: &PeerId) -> bool {
        self.connections.close(peer)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop accepting, stop dialing and close every connection.
    pub fn shutdown(&self) {
        info!("[swarm] shutting down, closing {} connections", self.connections.len());
        self.shutdown.cancel();
        self.connections.close_all();
    }

    // =========================================================================
    // Listening and dialing
    // =========================================================================

    /// Bind the configured listen address and start accepting peers.
    pub async fn listen(self: &Arc<Self>) -> Result<SocketAddr, SwarmError> {
        let listener = TcpListener::bind(&self.config.listen).await?;
        let addr = listener.local_addr()?;
        *self.local_addr.write() = Some(addr);
        info!("[swarm] listening on {}", addr);

        let swarm = Arc::clone(self);
        tokio::spawn(async move { swarm.accept_loop(listener).await });
        Ok(addr)
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, remote)) => {
                    if self.connections.len() >= self.config.max_peers {
                        debug!("[swarm] at capacity, refusing {}", remote);
                        continue;
                    }
                    let Ok(slot) = Arc::clone(&self.handshake_slots).try_acquire_owned() else {
                        debug!("[swarm] too many pending handshakes, refusing {}", remote);
                        continue;
                    };
                    let swarm = Arc::clone(&self);
                    tokio::spawn(async move {
                        let result = swarm
                            .establish(stream, remote, ConnectionDirection::Inbound, None)
                            .await;
                        drop(slot);
                        if let Err(e) = result {
                            debug!("[swarm] inbound {} refused: {}", remote, e);
                        }
                    });
                }
                Err(e) => warn!("[swarm] accept failed: {}", e),
            }
        }
        debug!("[swarm] accept loop stopped");
    }

    /// Connect to `addr`, handshake and admit the peer.
    pub async fn dial(self: &Arc<Self>, addr: &str) -> Result<PeerId, SwarmError> {
        if self.shutdown.is_cancelled() {
            return Err(SwarmError::ClosedDuringHandshake);
        }
        if self.connections.len() >= self.config.max_peers {
            return Err(SwarmError::AtCapacity(self.config.max_peers));
        }
        let stream = timeout(self.config.dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                SwarmError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("dial {addr} timed out"),
                ))
            })??;
        let remote = stream.peer_addr()?;
        self.establish(
            stream,
            remote,
            ConnectionDirection::Outbound,
            Some(addr.to_string()),
        )
        .await
    }

    /// Top up connections when below the low watermark.
    ///
    /// Known disconnected peers are tried first, then bootstrap addresses.
    /// Returns how many new connections were made.
    pub async fn rebalance(self: &Arc<Self>) -> usize {
        let connected = self.connections.len();
        let low = self.config.low_watermark.min(self.config.max_peers);
        if connected >= low || self.shutdown.is_cancelled() {
            return 0;
        }
        let room = self.config.max_peers.saturating_sub(connected);

        let known_addresses: Vec<String> = self
            .registry
            .all()
            .into_iter()
            .filter(|p| p.is_connected())
            .filter_map(|p| p.address)
            .collect();
        let own = self.local_addr().map(|a| a.to_string());

        let mut targets: Vec<String> = Vec::new();
        let candidates = self
            .registry
            .dial_candidates()
            .into_iter()
            .filter(|(peer, _)| !self.connections.contains(peer))
            .map(|(_, addr)| addr);
        for addr in candidates.chain(self.config.bootstrap.iter().cloned()) {
            if targets.len() >= room {
                break;
            }
            if known_addresses.contains(&addr)
                || targets.contains(&addr)
                || own.as_ref() == Some(&addr)
            {
                continue;
            }
            targets.push(addr);
        }
        if targets.is_empty() {
            return 0;
        }

        debug!(
            "[swarm] {} of {} peers, dialing {} addresses",
            connected,
            low,
            targets.len()
        );
        let results = futures::future::join_all(targets.iter().map(|addr| self.dial(addr))).await;
        let mut made = 0;
        for (addr, result) in targets.iter().zip(results) {
            match result {
                Ok(peer) => {
                    made += 1;
                    debug!("[swarm] dialed {} at {}", peer, addr);
                }
                Err(e) => debug!("[swarm] dial {} failed: {}", addr, e),
            }
        }
        made
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Send a ping to every connection.
    pub fn ping_all(&self) -> usize {
        let nonce = rand::random::<u64>();
        self.connections
            .peers()
            .iter()
            .filter(|peer| self.connections.try_send(peer, WireFrame::Ping { nonce }).is_ok())
            .count()
    }

    /// Close connections whose peers have been silent for `silence`.
    pub fn disconnect_silent(&self, silence: Duration) -> Vec<PeerId> {
        let mut closed = Vec::new();
        for (peer, connection) in self.registry.silent_peers(silence.as_secs()) {
            let current = self.connections.get(&peer).map(|h| h.id);
            if current == Some(connection) && self.connections.close(&peer) {
                info!("[swarm] {} silent for {:?}, disconnecting", peer, silence);
                closed.push(peer);
            }
        }
        closed
    }

    // =========================================================================
    // Connection setup
    // =========================================================================

    async fn establish(
        self: &Arc<Self>,
        stream: TcpStream,
        remote: SocketAddr,
        direction: ConnectionDirection,
        dialed: Option<String>,
    ) -> Result<PeerId, SwarmError> {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(self.config.max_frame_bytes)
            .new_codec();
        let mut transport = Framed::new(stream, codec);

        let (peer, announced) =
            timeout(self.config.handshake_timeout, self.handshake(&mut transport))
                .await
                .map_err(|_| SwarmError::HandshakeTimeout)??;

        let address = dialed.or_else(|| announced.map(|a| dialable_address(&a, remote)));
        let id = self.connections.next_id();
        self.registry
            .admit(&peer, address, id, self.config.max_peers)?;

        let (sender, outbound) = mpsc::channel(self.config.queue_capacity.max(1));
        let cancel = self.shutdown.child_token();
        let handle = ConnectionHandle::new(id, remote, direction, sender, cancel.clone());
        if !self.connections.insert(peer.clone(), handle) {
            self.registry.disconnect(&peer, id);
            return Err(SwarmError::Admission(RegistryError::AlreadyConnected(peer)));
        }

        info!("[swarm] {} connected ({:?}, {})", peer, direction, remote);
        let swarm = Arc::clone(self);
        let session_peer = peer.clone();
        tokio::spawn(async move {
            swarm
                .run_session(session_peer, id, transport, outbound, cancel)
                .await
        });
        Ok(peer)
    }

    /// Exchange challenges and hellos. Returns the verified peer id and the
    /// listen address it announced.
    async fn handshake(
        &self,
        transport: &mut Transport,
    ) -> Result<(PeerId, Option<String>), SwarmError> {
        let ours = handshake::challenge(&self.topic);
        send_frame(transport, &WireFrame::Challenge(ours.clone())).await?;

        let theirs = match recv_frame(transport).await? {
            WireFrame::Challenge(challenge) => challenge,
            other => return Err(SwarmError::UnexpectedFrame(other.name())),
        };
        handshake::check_challenge(&self.topic, &theirs)?;

        let listen = self.local_addr().map(|a| a.to_string());
        let signatures = self.signatures.as_ref();
        let hello = handshake::build_hello(signatures, &self.topic, &theirs.nonce, listen)?;
        send_frame(transport, &WireFrame::Hello(hello)).await?;

        let hello = match recv_frame(transport).await? {
            WireFrame::Hello(hello) => hello,
            other => return Err(SwarmError::UnexpectedFrame(other.name())),
        };
        let peer = handshake::verify_hello(signatures, &self.topic, &ours.nonce, &hello)?;
        Ok((peer, hello.listen))
    }

    // =========================================================================
    // Connection tasks
    // =========================================================================

    async fn run_session(
        self: Arc<Self>,
        peer: PeerId,
        id: ConnectionId,
        transport: Transport,
        outbound: mpsc::Receiver<WireFrame>,
        cancel: CancellationToken,
    ) {
        let (sink, stream) = transport.split();

        let writer = {
            let swarm = Arc::clone(&self);
            let peer = peer.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { swarm.write_loop(&peer, sink, outbound, cancel).await })
        };

        self.read_loop(&peer, stream, &cancel).await;
        cancel.cancel();
        if let Err(e) = writer.await {
            warn!("[swarm] writer for {} panicked: {}", peer, e);
        }

        self.connections.remove(&peer, id);
        self.registry.disconnect(&peer, id);
        info!("[swarm] {} disconnected", peer);
    }

    async fn write_loop(
        &self,
        peer: &PeerId,
        mut sink: SplitSink<Transport, bytes::Bytes>,
        mut outbound: mpsc::Receiver<WireFrame>,
        cancel: CancellationToken,
    ) {
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => break,
                frame = outbound.recv() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let bytes = match frame.encode() {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("[swarm] dropping unencodable {} frame: {}", frame.name(), e);
                    continue;
                }
            };
            match timeout(self.config.write_timeout, sink.send(bytes)).await {
                Ok(Ok(())) => self.registry.record_transport_success(peer),
                Ok(Err(e)) => {
                    debug!("[swarm] write to {} failed: {}", peer, e);
                    break;
                }
                Err(_) => {
                    warn!("[swarm] write to {} timed out", peer);
                    self.registry.record_transport_failure(peer);
                    break;
                }
            }
        }
        cancel.cancel();
    }

    async fn read_loop(
        &self,
        peer: &PeerId,
        mut stream: SplitStream<Transport>,
        cancel: &CancellationToken,
    ) {
        let mut limiter =
            RateLimiter::new(self.config.rate_limit_burst, self.config.rate_limit_per_sec);
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = stream.next() => next,
            };
            let bytes = match next {
                None => break,
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    if is_oversized(&e) {
                        warn!("[swarm] {} sent an oversized frame", peer);
                        self.gossip.report_malformed(peer, RejectReason::Oversized);
                    } else {
                        debug!("[swarm] read from {} failed: {}", peer, e);
                    }
                    break;
                }
            };

            self.registry.touch(peer);
            if !limiter.try_acquire(Instant::now()) {
                if self.strike(peer, RejectReason::RateLimited) {
                    break;
                }
                continue;
            }

            let frame = match WireFrame::decode(&bytes) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!("[swarm] undecodable frame from {}: {}", peer, e);
                    if self.strike(peer, RejectReason::Malformed) {
                        break;
                    }
                    continue;
                }
            };

            match frame {
                WireFrame::Gossip(message) => {
                    let gossip = Arc::clone(&self.gossip);
                    let from = peer.clone();
                    let disposition = tokio::task::spawn_blocking(move || {
                        gossip.handle_inbound(&from, message)
                    })
                    .await;
                    match disposition {
                        Ok(Disposition::Refused) => break,
                        Ok(Disposition::Rejected { strike, .. }) if strike.is_jailed() => break,
                        Ok(_) => {}
                        Err(e) => warn!("[swarm] gossip handling for {} failed: {}", peer, e),
                    }
                }
                WireFrame::Ping { nonce } => {
                    if let Err(e) = self.connections.try_send(peer, WireFrame::Pong { nonce }) {
                        debug!("[swarm] could not answer ping from {}: {:?}", peer, e);
                    }
                }
                WireFrame::Pong { .. } => {}
                WireFrame::Challenge(_) | WireFrame::Hello(_) => {
                    if self.strike(peer, RejectReason::Malformed) {
                        break;
                    }
                }
            }
        }
    }

    /// Strike `peer`; `true` when that leaves it jailed.
    fn strike(&self, peer: &PeerId, reason: RejectReason) -> bool {
        let outcome = self.gossip.report_malformed(peer, reason);
        if outcome.is_jailed() {
            info!("[swarm] {} jailed ({:?}), closing", peer, reason);
            return true;
        }
        false
    }
}

async fn send_frame(transport: &mut Transport, frame: &WireFrame) -> Result<(), SwarmError> {
    transport.send(frame.encode()?).await?;
    Ok(())
}

async fn recv_frame(transport: &mut Transport) -> Result<WireFrame, SwarmError> {
    match transport.next().await {
        Some(bytes) => WireFrame::decode(&bytes?),
        None => Err(SwarmError::ClosedDuringHandshake),
    }
}

fn is_oversized(error: &std::io::Error) -> bool {
    error
        .get_ref()
        .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>())
}

/// Address other nodes can dial for a peer that announced `announced`.
///
/// A wildcard bind (`0.0.0.0:port`) is replaced by the IP the peer connected
/// from.
pub fn dialable_address(announced: &str, remote: SocketAddr) -> String {
    match announced.parse::<SocketAddr>() {
        Ok(addr) if addr.ip().is_unspecified() => {
            SocketAddr::new(remote.ip(), addr.port()).to_string()
        }
        _ => announced.to_string(),
    }
}
