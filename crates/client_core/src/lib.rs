use std::sync::Arc;

use tracing::info;

pub mod api;
pub mod collection;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mirror;
pub mod notify;
pub mod reorder;
pub mod wizard;

pub use api::{
    Attachment, AuthSession, CollectionApi, EndpointOptions, HttpCollectionApi, ItemFields,
    Payload, ReorderMethod, StaticToken,
};
pub use collection::{Collection, LoadState, ReloadOutcome};
pub use dispatcher::{ActionOutcome, ItemActionDispatcher};
pub use error::ClientError;
pub use mirror::{Direction, LocalMirrorStore, MirrorCheckpoint, MoveOutcome, ReorderCommit};
pub use notify::{
    AutoConfirm, ConfirmPrompt, Confirmer, Notifier, Toast, ToastLevel, TracingNotifier,
};
pub use reorder::{ReorderSubmitter, RollbackPolicy, SubmitOutcome};

/// Everything one list screen needs: the collection, its reorder submitter
/// and its action dispatcher, all sharing the same mirror.
pub struct CollectionScreen<P: Payload> {
    pub collection: Arc<Collection<P>>,
    pub reorder: Arc<ReorderSubmitter<P>>,
    pub actions: Arc<ItemActionDispatcher<P>>,
    notifier: Arc<dyn Notifier>,
}

impl<P: Payload> CollectionScreen<P> {
    pub fn new(
        api: Arc<dyn CollectionApi<P>>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
        policy: RollbackPolicy,
    ) -> Self {
        let collection = Collection::new(api);
        let reorder = ReorderSubmitter::new(Arc::clone(&collection), Arc::clone(&notifier), policy);
        let actions =
            ItemActionDispatcher::new(Arc::clone(&collection), Arc::clone(&notifier), confirmer);
        Self {
            collection,
            reorder,
            actions,
            notifier,
        }
    }

    /// Initial load when the screen opens. Failures are reported to the user
    /// and leave the collection in `LoadState::Error`.
    pub async fn mount(&self) -> Result<ReloadOutcome, ClientError> {
        info!(endpoint = %self.collection.endpoint(), "mounting collection screen");
        self.collection.reload().await.inspect_err(|err| {
            notify::report_error(self.notifier.as_ref(), "load", err);
        })
    }

    /// Cancels whatever is still loading.
    pub fn unmount(&self) {
        self.collection.close();
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
