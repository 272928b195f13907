use crate::core::types::{BetBookSnapshot, SyncStatus};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::broadcast;

// ---------- Topic trait (broadcast semantics) ----------
#[async_trait]
pub trait Topic<T>: Sync + Send + 'static {
    /// Publish a message to all subscribers.
    async fn publish(&self, msg: T) -> Result<()>;

    /// Subscribe to the stream (each subscriber has an independent cursor).
    fn subscribe(&self) -> broadcast::Receiver<Arc<T>>;
}

// --- Broadcast topic: 1->N fanout, lossy under lag. Payloads travel as Arc<T>.
pub struct BroadcastTopic<T: Send + Sync + 'static> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> BroadcastTopic<T> {
    pub fn with_capacity(cap: usize) -> Self {
        let (tx, _rx) = broadcast::channel(cap);
        Self { tx }
    }
}

#[async_trait]
impl<T: Debug + Send + Sync + 'static> Topic<T> for BroadcastTopic<T> {
    async fn publish(&self, msg: T) -> Result<()> {
        // errors only when nobody is subscribed
        let _ = self.tx.send(Arc::new(msg));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

#[derive(Clone)]
pub struct Bus {
    pub bet_book: Arc<dyn Topic<BetBookSnapshot>>,
    pub sync_status: Arc<dyn Topic<SyncStatus>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        // snapshots are whole books, a short backlog is plenty
        let cap = 16;

        Self {
            bet_book: Arc::new(BroadcastTopic::<BetBookSnapshot>::with_capacity(cap)),
            sync_status: Arc::new(BroadcastTopic::<SyncStatus>::with_capacity(cap)),
        }
    }
}
