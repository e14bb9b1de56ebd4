//! # Connection Table
//!
//! Live connections keyed by peer. Each entry owns the sending half of the
//! connection's bounded outbound queue and the token that tears it down.

use crate::domain::frames::WireFrame;
use parking_lot::RwLock;
use shared_types::{ConnectionId, PeerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub remote: SocketAddr,
    pub direction: ConnectionDirection,
    sender: mpsc::Sender<WireFrame>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(
        id: ConnectionId,
        remote: SocketAddr,
        direction: ConnectionDirection,
        sender: mpsc::Sender<WireFrame>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            remote,
            direction,
            sender,
            cancel,
        }
    }
}

/// Why a frame could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    NotConnected,
    Full,
    Closed,
}

#[derive(Debug, Default)]
pub struct ConnectionTable {
    connections: RwLock<HashMap<PeerId, ConnectionHandle>>,
    next_id: AtomicU64,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register `handle` for `peer`. Returns `false` if the peer already has
    /// a connection, which is left untouched.
    pub fn insert(&self, peer: PeerId, handle: ConnectionHandle) -> bool {
        let mut connections = self.connections.write();
        if connections.contains_key(&peer) {
            return false;
        }
        connections.insert(peer, handle);
        true
    }

    /// Drop the entry for `peer` only if it is still connection `id`.
    pub fn remove(&self, peer: &PeerId, id: ConnectionId) -> bool {
        let mut connections = self.connections.write();
        if connections.get(peer).is_some_and(|h| h.id == id) {
            connections.remove(peer);
            return true;
        }
        false
    }

    /// Cancel the peer's connection. Its tasks clean up the table entry.
    pub fn close(&self, peer: &PeerId) -> bool {
        match self.connections.read().get(peer) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn close_all(&self) {
        for handle in self.connections.read().values() {
            handle.cancel.cancel();
        }
    }

    /// Queue a frame without waiting.
    pub fn try_send(&self, peer: &PeerId, frame: WireFrame) -> Result<(), QueueError> {
        let connections = self.connections.read();
        let handle = connections.get(peer).ok_or(QueueError::NotConnected)?;
        handle.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    pub fn get(&self, peer: &PeerId) -> Option<ConnectionHandle> {
        self.connections.read().get(peer).cloned()
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.connections.read().contains_key(peer)
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.connections.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
