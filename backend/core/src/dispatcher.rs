use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use crate::error::DispatchError;
use crate::queue::{self, QueueReceiver, QueueSender};

/// Identifies one registered outlet.
pub type SubscriptionId = u64;

struct Registry<T> {
    outlets: HashMap<SubscriptionId, QueueSender<T>>,
    closed: bool,
}

type SharedRegistry<T> = Arc<Mutex<Registry<T>>>;

type Outlets<T> = Vec<(SubscriptionId, QueueSender<T>)>;

/// An item on its way through the inlet, with the outlets registered when it
/// was submitted.
struct Envelope<T> {
    item: T,
    outlets: Outlets<T>,
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot<T>(registry: &Mutex<Registry<T>>) -> Outlets<T> {
    lock(registry)
        .outlets
        .iter()
        .map(|(id, tx)| (*id, tx.clone()))
        .collect()
}

/// Single-producer, multi-consumer broadcast of every submitted item.
///
/// The producer feeds items through the [`Inlet`]; each item is addressed to
/// the outlets registered at the moment it is submitted. [`Dispatcher::run`]
/// offers the item to exactly those outlets and waits until all of those offers have either been delivered
/// or found their receiver gone before moving on to the next item. Every
/// consumer therefore sees items in the same relative order.
///
/// Dropping the inlet closes the dispatcher: `run` drains what is left,
/// releases every outlet so consumers observe end-of-stream, and returns.
pub struct Dispatcher<T> {
    registry: SharedRegistry<T>,
    next_id: AtomicU64,
    inlet: Mutex<Option<Inlet<T>>>,
    inlet_rx: Mutex<Option<QueueReceiver<Envelope<T>>>>,
}

impl<T: Clone + Send + 'static> Dispatcher<T> {
    /// Create a dispatcher whose inlet buffers `inlet_capacity` items
    /// (0 = the producer waits until the broadcast loop takes each item).
    pub fn new(inlet_capacity: usize) -> Self {
        let (tx, rx) = queue::bounded(inlet_capacity);
        let registry = Arc::new(Mutex::new(Registry {
            outlets: HashMap::new(),
            closed: false,
        }));
        info!(inlet_capacity, "Dispatcher initialized");
        Self {
            inlet: Mutex::new(Some(Inlet {
                tx,
                registry: Arc::clone(&registry),
            })),
            registry,
            next_id: AtomicU64::new(0),
            inlet_rx: Mutex::new(Some(rx)),
        }
    }

    /// Take the producer handle (can only be called once).
    pub fn take_inlet(&self) -> Option<Inlet<T>> {
        debug!("Dispatcher inlet taken");
        self.inlet
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Register a new outlet holding at most `capacity` undelivered items
    /// (0 = synchronous hand-off).
    ///
    /// Once the dispatcher has closed, the returned subscription is already at
    /// end-of-stream.
    pub fn open_subscription(&self, capacity: usize) -> Subscription<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = queue::bounded(capacity);
        {
            let mut registry = lock(&self.registry);
            if registry.closed {
                debug!(subscription = id, "Dispatcher closed; subscription starts at end-of-stream");
            } else {
                registry.outlets.insert(id, tx);
                debug!(subscription = id, capacity, outlets = registry.outlets.len(), "Subscription opened");
            }
        }
        Subscription {
            id,
            rx,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Deregister an outlet. Returns whether it was still registered.
    ///
    /// An offer already in flight to this outlet is allowed to finish.
    pub fn close_subscription(&self, id: SubscriptionId) -> bool {
        deregister(&self.registry, id)
    }

    /// Number of currently registered outlets.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).outlets.len()
    }

    /// Broadcast loop. Runs until the inlet is closed and drained.
    pub async fn run(&self) -> Result<(), DispatchError> {
        let mut inlet_rx = self
            .inlet_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(DispatchError::AlreadyRunning)?;

        info!("Dispatcher started");
        let mut dispatched: u64 = 0;

        while let Some(Envelope { item, outlets }) = inlet_rx.recv().await {
            let mut offers = JoinSet::new();
            for (id, outlet) in outlets {
                let item = item.clone();
                offers.spawn(async move { (id, outlet.send(item).await) });
            }

            let mut delivered = 0usize;
            while let Some(joined) = offers.join_next().await {
                match joined {
                    Ok((_, Ok(()))) => delivered += 1,
                    Ok((id, Err(_))) => {
                        trace!(subscription = id, "Outlet gone; item dropped for it");
                    }
                    Err(e) => warn!(error = %e, "Outlet offer task failed"),
                }
            }

            dispatched += 1;
            debug!(seq = dispatched, delivered, "Item broadcast");
        }

        let released = {
            let mut registry = lock(&self.registry);
            registry.closed = true;
            let released = registry.outlets.len();
            registry.outlets.clear();
            released
        };
        info!(dispatched, released, "Dispatcher closed");
        Ok(())
    }
}

fn deregister<T>(registry: &Mutex<Registry<T>>, id: SubscriptionId) -> bool {
    let removed = lock(registry).outlets.remove(&id).is_some();
    if removed {
        debug!(subscription = id, "Subscription closed");
    }
    removed
}

/// Producer handle feeding the dispatcher. Dropping it closes the dispatcher.
pub struct Inlet<T> {
    tx: QueueSender<Envelope<T>>,
    registry: SharedRegistry<T>,
}

impl<T> Inlet<T> {
    /// Enqueue an item for broadcast, waiting while the inlet is full.
    ///
    /// The item goes to the outlets registered when `submit` is called;
    /// subscriptions opened afterwards never receive it.
    pub async fn submit(&self, item: T) -> Result<(), DispatchError> {
        let outlets = snapshot(&self.registry);
        self.tx
            .send(Envelope { item, outlets })
            .await
            .map_err(|_| DispatchError::InletClosed)
    }
}

/// A consumer's private outlet. Deregisters itself when dropped.
pub struct Subscription<T> {
    id: SubscriptionId,
    rx: QueueReceiver<T>,
    registry: SharedRegistry<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next broadcast item, or `None` once the outlet is released and drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.rx.close();
        deregister(&self.registry, self.id);
    }
}
