//! Commits finished reorder gestures to the backend.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    api::Payload,
    collection::Collection,
    error::ClientError,
    mirror::{Direction, MoveOutcome, ReorderCommit},
    notify::{report_error, Notifier, Toast},
};

pub const ORDER_SAVED_MESSAGE: &str = "Order saved.";

/// What to do with the mirror when the backend refuses a new order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Put the rows back where they were before the gesture.
    #[default]
    RestoreSnapshot,
    /// Leave the local order diverged until the next reload.
    KeepLocal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved {
        seq: u64,
    },
    /// The gesture did not change the order, or the move was ignored.
    NothingToSave(Option<MoveOutcome>),
    /// A later submission was issued before this one answered.
    Superseded {
        seq: u64,
    },
    Failed {
        seq: u64,
        error: ClientError,
        rolled_back: bool,
    },
}

pub struct ReorderSubmitter<P: Payload> {
    collection: Arc<Collection<P>>,
    notifier: Arc<dyn Notifier>,
    policy: RollbackPolicy,
    seq: AtomicU64,
    in_flight: AtomicUsize,
}

impl<P: Payload> ReorderSubmitter<P> {
    pub fn new(
        collection: Arc<Collection<P>>,
        notifier: Arc<dyn Notifier>,
        policy: RollbackPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            collection,
            notifier,
            policy,
            seq: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn latest_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    pub async fn submit(&self, commit: ReorderCommit) -> SubmitOutcome {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let endpoint = self.collection.endpoint();
        debug!(endpoint, seq, items = commit.entries.len(), "submitting reorder");

        let result = {
            let _guard = InFlight::enter(&self.in_flight);
            self.collection.api().reorder(&commit.entries).await
        };

        if seq != self.seq.load(Ordering::SeqCst) {
            debug!(endpoint, seq, "discarding superseded reorder response");
            return SubmitOutcome::Superseded { seq };
        }

        match result {
            Ok(()) => {
                info!(endpoint, seq, "order saved");
                self.notifier.toast(Toast::success(ORDER_SAVED_MESSAGE));
                SubmitOutcome::Saved { seq }
            }
            Err(error) => {
                let rolled_back = match self.policy {
                    RollbackPolicy::RestoreSnapshot => {
                        self.collection.mirror().await.restore(&commit.checkpoint)
                    }
                    RollbackPolicy::KeepLocal => false,
                };
                report_error(self.notifier.as_ref(), "reorder", &error);
                SubmitOutcome::Failed {
                    seq,
                    error,
                    rolled_back,
                }
            }
        }
    }

    /// Drag-and-drop: the drop is the commit point.
    pub async fn commit_drop(&self) -> SubmitOutcome {
        let commit = self.collection.mirror().await.drop_commit();
        match commit {
            Some(commit) => self.submit(commit).await,
            None => SubmitOutcome::NothingToSave(None),
        }
    }

    /// Arrow buttons: move one step and save right away.
    pub async fn arrow_move(&self, index: usize, direction: Direction) -> SubmitOutcome {
        let commit = {
            let mut mirror = self.collection.mirror().await;
            let checkpoint = mirror.checkpoint();
            let outcome = mirror.move_by_arrow(index, direction);
            if !outcome.is_moved() {
                return SubmitOutcome::NothingToSave(Some(outcome));
            }
            ReorderCommit {
                entries: mirror.reorder_entries(),
                checkpoint,
            }
        };
        self.submit(commit).await
    }

    /// Moves a row to an arbitrary index and saves.
    pub async fn move_to(&self, from: usize, to: usize) -> SubmitOutcome {
        let commit = {
            let mut mirror = self.collection.mirror().await;
            let checkpoint = mirror.checkpoint();
            let outcome = mirror.move_item(from, to);
            if !outcome.is_moved() {
                return SubmitOutcome::NothingToSave(Some(outcome));
            }
            ReorderCommit {
                entries: mirror.reorder_entries(),
                checkpoint,
            }
        };
        self.submit(commit).await
    }

    /// Fire-and-forget variant of [`Self::commit_drop`].
    pub fn spawn_commit_drop(self: &Arc<Self>) -> JoinHandle<SubmitOutcome> {
        let submitter = Arc::clone(self);
        tokio::spawn(async move { submitter.commit_drop().await })
    }

    /// Fire-and-forget variant of [`Self::arrow_move`].
    pub fn spawn_arrow_move(
        self: &Arc<Self>,
        index: usize,
        direction: Direction,
    ) -> JoinHandle<SubmitOutcome> {
        let submitter = Arc::clone(self);
        tokio::spawn(async move { submitter.arrow_move(index, direction).await })
    }
}

/// Counts one request while alive, including when the submit future is
/// dropped mid-request.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "tests/reorder_tests.rs"]
mod tests;
