use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::{CollectionApi, Payload},
    error::ClientError,
    mirror::LocalMirrorStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Mutating,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { generation: u64, len: usize },
    /// A newer reload was issued while this one was in flight.
    Stale { generation: u64 },
}

/// One screen's copy of a remote collection. Not shared across screens; every
/// screen builds its own and drops it on close.
pub struct Collection<P: Payload> {
    api: Arc<dyn CollectionApi<P>>,
    mirror: Mutex<LocalMirrorStore<P>>,
    state: Mutex<LoadState>,
    generation: AtomicU64,
    cancel: CancellationToken,
}

impl<P: Payload> Collection<P> {
    pub fn new(api: Arc<dyn CollectionApi<P>>) -> Arc<Self> {
        let position_base = api.position_base();
        Arc::new(Self {
            api,
            mirror: Mutex::new(LocalMirrorStore::new(position_base)),
            state: Mutex::new(LoadState::Idle),
            generation: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        })
    }

    pub fn api(&self) -> &Arc<dyn CollectionApi<P>> {
        &self.api
    }

    pub fn endpoint(&self) -> &str {
        self.api.endpoint()
    }

    pub async fn mirror(&self) -> MutexGuard<'_, LocalMirrorStore<P>> {
        self.mirror.lock().await
    }

    pub async fn state(&self) -> LoadState {
        self.state.lock().await.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fetches the whole collection and replaces the mirror with it.
    pub async fn reload(&self) -> Result<ReloadOutcome, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Cancelled);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.lock().await = LoadState::Loading;
        debug!(endpoint = %self.endpoint(), generation, "reloading collection");

        let fetched = tokio::select! {
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.api.fetch_all() => result,
        };

        let mut mirror = self.mirror.lock().await;
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(endpoint = %self.endpoint(), generation, "discarding stale reload response");
            return Ok(ReloadOutcome::Stale { generation });
        }

        let mut state = self.state.lock().await;
        match fetched {
            Ok(items) => {
                let len = items.len();
                mirror.replace_all(items);
                *state = LoadState::Loaded;
                info!(endpoint = %self.endpoint(), generation, len, "collection loaded");
                Ok(ReloadOutcome::Applied { generation, len })
            }
            Err(ClientError::Cancelled) => {
                *state = LoadState::Idle;
                Err(ClientError::Cancelled)
            }
            Err(err) => {
                warn!(endpoint = %self.endpoint(), generation, error = %err, "collection load failed");
                *state = LoadState::Error(err.user_message());
                Err(err)
            }
        }
    }

    /// Returns the state the mutation started from, for `abort_mutation`.
    pub(crate) async fn begin_mutation(&self) -> LoadState {
        std::mem::replace(&mut *self.state.lock().await, LoadState::Mutating)
    }

    /// Back to where the mutation started, so a failed action never turns an
    /// empty or failed collection into a loaded one.
    pub(crate) async fn abort_mutation(&self, previous: LoadState) {
        let mut state = self.state.lock().await;
        if *state == LoadState::Mutating {
            *state = previous;
        }
    }

    /// `Error → Idle`. The next load is up to the user.
    pub async fn acknowledge_error(&self) -> bool {
        let mut state = self.state.lock().await;
        if matches!(*state, LoadState::Error(_)) {
            *state = LoadState::Idle;
            return true;
        }
        false
    }

    /// Cancels in-flight reloads and refuses new ones, e.g. when the user
    /// navigates away.
    pub fn close(&self) {
        self.cancel.cancel();
        info!(endpoint = %self.endpoint(), "collection closed");
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
