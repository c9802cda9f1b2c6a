use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::planner::SearchError;

use super::TransitNetwork;

#[derive(Debug, Clone)]
struct Generation {
    number: u64,
    network: Arc<TransitNetwork>,
}

/// The slot holding the active network generation.
///
/// A new generation is built off to the side and swapped in whole by
/// [`NetworkHandle::publish`]. Readers that started on an older generation
/// keep it alive until their [`ReadScope`] is dropped.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    slot: Arc<watch::Sender<Option<Generation>>>,
    active: Arc<AtomicUsize>,
}

impl Default for NetworkHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkHandle {
    /// An empty handle; readers wait until a network is published.
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handle with `network` already published.
    pub fn with_network(network: TransitNetwork) -> Self {
        let handle = Self::new();
        handle.publish(network);
        handle
    }

    /// Make `network` the active generation. Returns its generation number.
    ///
    /// Numbering happens under the slot's lock, so concurrent publishes are
    /// applied in number order and the newest always ends up active.
    pub fn publish(&self, network: TransitNetwork) -> u64 {
        let network = Arc::new(network);
        let mut number = 0;
        self.slot.send_modify(|slot| {
            number = slot.as_ref().map_or(0, |g| g.number) + 1;
            *slot = Some(Generation { number, network });
        });
        info!(generation = number, "Published network generation");
        number
    }

    /// The active generation number, if one has been published.
    pub fn generation(&self) -> Option<u64> {
        self.slot.borrow().as_ref().map(|g| g.number)
    }

    /// Open a read scope on the active generation, waiting for one to be
    /// published if necessary.
    pub async fn read(&self) -> Result<ReadScope, SearchError> {
        let mut receiver = self.slot.subscribe();
        let current = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| SearchError::NotReady)?
            .clone();
        current
            .map(|generation| self.scope(generation))
            .ok_or(SearchError::NotReady)
    }

    /// Open a read scope without waiting; `None` before the first publish.
    pub fn try_read(&self) -> Option<ReadScope> {
        let current = self.slot.borrow().clone();
        current.map(|generation| self.scope(generation))
    }

    /// Read scopes currently open across all generations.
    pub fn active_scopes(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn scope(&self, generation: Generation) -> ReadScope {
        self.active.fetch_add(1, Ordering::SeqCst);
        debug!(generation = generation.number, "Opened read scope");
        ReadScope {
            generation: generation.number,
            network: generation.network,
            active: self.active.clone(),
        }
    }
}

/// A query's hold on one network generation, released on drop.
#[derive(Debug)]
pub struct ReadScope {
    generation: u64,
    network: Arc<TransitNetwork>,
    active: Arc<AtomicUsize>,
}

impl ReadScope {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn network(&self) -> &Arc<TransitNetwork> {
        &self.network
    }
}

impl Drop for ReadScope {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
