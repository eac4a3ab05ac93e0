// Favorites store - in-memory collection mirrored to key-value storage by a single writer task

use cinescout_cache::KeyValueStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::models::{FavoriteId, FavoriteItem};
use crate::{Error, Result};

/// Storage key the collection lives under
pub const FAVORITES_KEY: &str = "favorites";

type WriteAck = std::result::Result<(), String>;

struct WriteRequest {
    payload: String,
    ack: oneshot::Sender<WriteAck>,
}

/// Process-wide favorites, shared by reference (wrap it in an `Arc`)
pub struct FavoritesStore {
    items: Mutex<Vec<FavoriteItem>>,
    published: watch::Sender<Vec<FavoriteItem>>,
    writes: mpsc::UnboundedSender<WriteRequest>,
}

impl FavoritesStore {
    /// Hydrate from storage and start the writer task
    ///
    /// Never fails: a missing, unreadable or corrupt record all mean
    /// "start with no favorites".
    pub async fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let items = hydrate(storage.as_ref()).await;
        info!("Loaded {} favorites", items.len());

        let (published, _) = watch::channel(items.clone());
        let (writes, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(storage, queue));

        Self {
            items: Mutex::new(items),
            published,
            writes,
        }
    }

    /// Add the item if its id isn't favorited yet, otherwise remove it
    ///
    /// Returns the collection after the toggle. If the write to storage
    /// fails the in-memory state still reflects the toggle and the error
    /// is returned.
    pub async fn toggle_favorite(&self, item: FavoriteItem) -> Result<Vec<FavoriteItem>> {
        item.validate()?;

        // Mutate, serialize and enqueue under one lock so queue order == toggle order
        let (snapshot, written) = {
            let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);

            let mut next = items.clone();
            match next.iter().position(|fav| fav.id == item.id) {
                Some(index) => {
                    debug!("Removing favorite {}", item.id);
                    next.remove(index);
                }
                None => {
                    debug!("Adding favorite {}", item.id);
                    next.push(item);
                }
            }

            let payload = serialize_collection(&next)?;
            *items = next;

            let (ack, written) = oneshot::channel();
            let queued = self.writes.send(WriteRequest { payload, ack }).is_ok();

            self.published.send_replace(items.clone());
            (items.clone(), queued.then_some(written))
        };

        let Some(written) = written else {
            return Err(Error::Persistence("favorites writer has stopped".into()));
        };

        match written.await {
            Ok(Ok(())) => Ok(snapshot),
            Ok(Err(reason)) => Err(Error::Persistence(reason)),
            Err(_) => Err(Error::Persistence("favorites writer has stopped".into())),
        }
    }

    pub fn is_favorite(&self, id: &FavoriteId) -> bool {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|fav| &fav.id == id)
    }

    /// Current collection, oldest favorite first
    pub fn get_all(&self) -> Vec<FavoriteItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observe the collection; the receiver always sees the latest state
    pub fn subscribe(&self) -> watch::Receiver<Vec<FavoriteItem>> {
        self.published.subscribe()
    }
}

/// Serialize a collection to the persisted text form
///
/// Refuses items that wouldn't parse back to themselves.
pub fn serialize_collection(items: &[FavoriteItem]) -> Result<String> {
    for item in items {
        item.validate()?;
    }
    Ok(serde_json::to_string(items)?)
}

/// Parse the persisted text form
///
/// The outer value must be a JSON array. Entries without a usable id are
/// skipped, and a repeated id keeps its first occurrence.
pub fn parse_collection(raw: &str) -> Result<Vec<FavoriteItem>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(values.len());

    for value in values {
        match FavoriteItem::from_json(value) {
            Ok(item) => {
                if seen.insert(item.id.clone()) {
                    items.push(item);
                } else {
                    warn!("Dropping duplicate favorite {}", item.id);
                }
            }
            Err(e) => warn!("Skipping stored favorite: {}", e),
        }
    }

    Ok(items)
}

async fn hydrate(storage: &dyn KeyValueStore) -> Vec<FavoriteItem> {
    match storage.get(FAVORITES_KEY).await {
        Ok(Some(raw)) => parse_collection(&raw).unwrap_or_else(|e| {
            warn!("Stored favorites are corrupt, starting empty: {}", e);
            Vec::new()
        }),
        Ok(None) => {
            debug!("No stored favorites");
            Vec::new()
        }
        Err(e) => {
            warn!("Could not read stored favorites, starting empty: {}", e);
            Vec::new()
        }
    }
}

/// Single writer: drains the queue in order, writing only the newest snapshot
/// of each batch and acknowledging everyone in it
async fn run_writer(storage: Arc<dyn KeyValueStore>, mut queue: mpsc::UnboundedReceiver<WriteRequest>) {
    while let Some(first) = queue.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = queue.try_recv() {
            batch.push(next);
        }

        if batch.len() > 1 {
            debug!("Coalescing {} favorites writes", batch.len());
        }

        let Some(latest) = batch.last() else {
            continue;
        };

        let result = storage
            .set(FAVORITES_KEY, &latest.payload)
            .await
            .map_err(|e| e.to_string());

        if let Err(ref reason) = result {
            warn!("Failed to persist favorites: {}", reason);
        }

        for request in batch {
            // Caller may have stopped waiting; the write happened regardless
            let _ = request.ack.send(result.clone());
        }
    }

    debug!("Favorites writer stopped");
}
