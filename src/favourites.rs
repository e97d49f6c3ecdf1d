use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::storage::KeyValueStorage;

pub const FAVOURITES_KEY: &str = "favourite-movies";
const STATE_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedFavourites {
    state: FavouritesState,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FavouritesState {
    favourites: Vec<i32>,
}

enum WriteCommand {
    Persist(Vec<i32>),
    Flush(oneshot::Sender<()>),
}

/// Ordered set of favourite movie ids. Mutations apply to memory immediately
/// and are mirrored to storage in the background, in mutation order.
#[derive(Clone)]
pub struct FavouritesStore {
    favourites: Arc<RwLock<Vec<i32>>>,
    writer: mpsc::UnboundedSender<WriteCommand>,
}

impl FavouritesStore {
    /// Rehydrates from storage and starts the write-through task. Must be
    /// called inside a tokio runtime.
    pub async fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let favourites = match storage.get_item(FAVOURITES_KEY).await {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read stored favourites, starting empty: {:#}", e);
                Vec::new()
            }
        };
        info!("Loaded {} favourite movies", favourites.len());

        let (writer, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_through(storage, rx));
        Self {
            favourites: Arc::new(RwLock::new(favourites)),
            writer,
        }
    }

    pub fn add(&self, movie_id: i32) {
        if movie_id <= 0 {
            warn!("Ignoring favourite with invalid movie id {}", movie_id);
            return;
        }
        let mut favourites = self.favourites.write();
        if favourites.contains(&movie_id) {
            return;
        }
        favourites.push(movie_id);
        self.persist(favourites.clone());
        drop(favourites);
        debug!("Added movie {} to favourites", movie_id);
    }

    pub fn remove(&self, movie_id: i32) {
        let mut favourites = self.favourites.write();
        let before = favourites.len();
        favourites.retain(|id| *id != movie_id);
        if favourites.len() == before {
            return;
        }
        self.persist(favourites.clone());
        drop(favourites);
        debug!("Removed movie {} from favourites", movie_id);
    }

    pub fn is_favourite(&self, movie_id: i32) -> bool {
        self.favourites.read().contains(&movie_id)
    }

    pub fn clear(&self) {
        let mut favourites = self.favourites.write();
        favourites.clear();
        self.persist(Vec::new());
        drop(favourites);
        debug!("Cleared favourites");
    }

    /// Ids in the order they were added.
    pub fn favourites(&self) -> Vec<i32> {
        self.favourites.read().clone()
    }

    pub fn len(&self) -> usize {
        self.favourites.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.favourites.read().is_empty()
    }

    /// Resolves once every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.writer.send(WriteCommand::Flush(tx)).is_err() {
            return;
        }
        let _ = rx.await;
    }

    // Callers hold the write guard so snapshots reach the writer in the
    // same order the mutations were applied.
    fn persist(&self, snapshot: Vec<i32>) {
        if self.writer.send(WriteCommand::Persist(snapshot)).is_err() {
            warn!("Favourites writer has stopped; change kept in memory only");
        }
    }
}

async fn write_through(
    storage: Arc<dyn KeyValueStorage>,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Persist(favourites) => {
                let payload = PersistedFavourites {
                    state: FavouritesState { favourites },
                    version: STATE_VERSION,
                };
                let encoded = match serde_json::to_string(&payload) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("Failed to encode favourites: {}", e);
                        continue;
                    }
                };
                if let Err(e) = storage.set_item(FAVOURITES_KEY, &encoded).await {
                    warn!("Failed to persist favourites: {:#}", e);
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("Favourites writer stopped");
}

fn decode(raw: &str) -> Vec<i32> {
    let persisted: PersistedFavourites = match serde_json::from_str(raw) {
        Ok(p) => p,
        Err(e) => {
            warn!("Stored favourites are malformed, starting empty: {}", e);
            return Vec::new();
        }
    };
    let mut favourites = Vec::with_capacity(persisted.state.favourites.len());
    for id in persisted.state.favourites {
        if id > 0 && !favourites.contains(&id) {
            favourites.push(id);
        }
    }
    favourites
}
