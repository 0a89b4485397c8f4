//! Best-effort message channel to the paired device.
//!
//! `send` never blocks and never reports failure: an unreachable peer simply
//! misses the message. `receive` yields whatever arrives, in arrival order,
//! until the subscriber drops the stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::sync::types::SyncPayload;

pub type PayloadStream = BoxStream<'static, SyncPayload>;

/// Link between the phone and watch applications.
pub trait CompanionTransport: Send + Sync {
    /// Fire-and-forget delivery to the peer.
    fn send(&self, payload: SyncPayload);

    /// Unending stream of payloads sent by the peer.
    fn receive(&self) -> PayloadStream;
}

/// Transport for a device with no companion: sends vanish, nothing arrives.
#[derive(Debug, Clone, Default)]
pub struct NullTransport;

impl CompanionTransport for NullTransport {
    fn send(&self, _payload: SyncPayload) {}

    fn receive(&self) -> PayloadStream {
        stream::pending().boxed()
    }
}

const CHANNEL_CAPACITY: usize = 64;

/// In-process transport endpoint. Create connected endpoints with [`pair`](Self::pair).
///
/// Slow receivers lose the oldest payloads, and payloads sent while the link
/// is unreachable are discarded, like the real watch link.
#[derive(Debug, Clone)]
pub struct InMemoryTransport {
    outbox: broadcast::Sender<SyncPayload>,
    inbox: broadcast::Sender<SyncPayload>,
    reachable: Arc<AtomicBool>,
}

impl InMemoryTransport {
    /// Two endpoints wired to each other, e.g. phone and watch.
    pub fn pair() -> (Self, Self) {
        let (a_to_b, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (b_to_a, _) = broadcast::channel(CHANNEL_CAPACITY);
        let reachable = Arc::new(AtomicBool::new(true));
        let a = Self {
            outbox: a_to_b.clone(),
            inbox: b_to_a.clone(),
            reachable: reachable.clone(),
        };
        let b = Self {
            outbox: b_to_a,
            inbox: a_to_b,
            reachable,
        };
        (a, b)
    }

    /// Simulate the peer going out of range (affects both endpoints).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

impl CompanionTransport for InMemoryTransport {
    fn send(&self, payload: SyncPayload) {
        if !self.is_reachable() {
            return;
        }
        // No subscriber on the other side is the same as an unreachable peer.
        let _ = self.outbox.send(payload);
    }

    fn receive(&self) -> PayloadStream {
        BroadcastStream::new(self.inbox.subscribe())
            .filter_map(|item| async move { item.ok() })
            .boxed()
    }
}
