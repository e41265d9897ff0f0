//! Create/update/delete/toggle actions. Every successful action is followed
//! by a full reload; responses are never spliced into the mirror.

use std::{future::Future, sync::Arc};

use shared::domain::ItemId;
use tracing::info;

use crate::{
    api::{ItemFields, Payload},
    collection::{Collection, LoadState},
    error::ClientError,
    notify::{report_error, ConfirmPrompt, Confirmer, Notifier, Toast},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The user said no at a confirmation prompt.
    Declined,
}

pub struct ItemActionDispatcher<P: Payload> {
    collection: Arc<Collection<P>>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
}

impl<P: Payload> ItemActionDispatcher<P> {
    pub fn new(
        collection: Arc<Collection<P>>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            collection,
            notifier,
            confirmer,
        })
    }

    pub async fn create(&self, fields: ItemFields) -> Result<ActionOutcome, ClientError> {
        let api = Arc::clone(self.collection.api());
        self.mutate("create", "Item created.", api.create(fields))
            .await
    }

    pub async fn update(
        &self,
        id: &ItemId,
        fields: ItemFields,
    ) -> Result<ActionOutcome, ClientError> {
        let api = Arc::clone(self.collection.api());
        self.mutate("update", "Changes saved.", api.update(id, fields))
            .await
    }

    pub async fn toggle_active(
        &self,
        id: &ItemId,
        current: bool,
    ) -> Result<ActionOutcome, ClientError> {
        let api = Arc::clone(self.collection.api());
        let message = if current {
            "Item hidden."
        } else {
            "Item published."
        };
        self.mutate(
            "toggle_active",
            message,
            api.update(id, ItemFields::toggled(!current)),
        )
        .await
    }

    /// Asks first. If the backend reports dependents, asks again with the
    /// count and retries once with the force flag.
    pub async fn remove(
        &self,
        id: &ItemId,
        label: Option<&str>,
    ) -> Result<ActionOutcome, ClientError> {
        let prompt = ConfirmPrompt::Delete {
            id: id.clone(),
            label: label.map(str::to_string),
        };
        if !self.confirmer.confirm(&prompt).await {
            return Ok(ActionOutcome::Declined);
        }

        let previous = self.collection.begin_mutation().await;
        let api = self.collection.api();
        match api.delete(id, false).await {
            Ok(()) => {}
            Err(ClientError::HasDependents {
                dependents,
                message,
                ..
            }) => {
                info!(endpoint = %self.collection.endpoint(), %id, dependents, "delete blocked by dependents");
                let prompt = ConfirmPrompt::ForceDelete {
                    id: id.clone(),
                    dependents,
                    message,
                };
                if !self.confirmer.confirm(&prompt).await {
                    self.collection.abort_mutation(previous).await;
                    return Ok(ActionOutcome::Declined);
                }
                if let Err(err) = api.delete(id, true).await {
                    return Err(self.fail("remove", previous, err).await);
                }
            }
            Err(err) => return Err(self.fail("remove", previous, err).await),
        }
        self.finish("remove", "Item deleted.").await
    }

    async fn mutate(
        &self,
        action: &'static str,
        success: &'static str,
        request: impl Future<Output = Result<(), ClientError>>,
    ) -> Result<ActionOutcome, ClientError> {
        let previous = self.collection.begin_mutation().await;
        if let Err(err) = request.await {
            return Err(self.fail(action, previous, err).await);
        }
        self.finish(action, success).await
    }

    async fn finish(
        &self,
        action: &'static str,
        success: &'static str,
    ) -> Result<ActionOutcome, ClientError> {
        match self.collection.reload().await {
            Ok(_) => {
                info!(endpoint = %self.collection.endpoint(), action, "action completed");
                self.notifier.toast(Toast::success(success));
                Ok(ActionOutcome::Completed)
            }
            Err(err) => {
                report_error(self.notifier.as_ref(), action, &err);
                Err(err)
            }
        }
    }

    async fn fail(
        &self,
        action: &'static str,
        previous: LoadState,
        err: ClientError,
    ) -> ClientError {
        self.collection.abort_mutation(previous).await;
        report_error(self.notifier.as_ref(), action, &err);
        err
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
