//! In-process doubles shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::{
    domain::{Contact, ItemId, OrderedItem},
    protocol::ReorderEntry,
};
use tokio::sync::oneshot;

use crate::{
    api::{CollectionApi, ItemFields},
    error::ClientError,
    notify::{ConfirmPrompt, Confirmer, Notifier, Toast, ToastLevel},
};

pub fn contact(id: i64, position: i64, name: &str) -> OrderedItem<Contact> {
    OrderedItem::new(
        id,
        position,
        Contact {
            name: name.to_string(),
            ..Contact::default()
        },
    )
}

pub fn three_contacts() -> Vec<OrderedItem<Contact>> {
    vec![
        contact(1, 0, "Admisiones"),
        contact(2, 1, "Becas"),
        contact(3, 2, "Registro"),
    ]
}

pub fn ids(items: &[ItemId]) -> Vec<i64> {
    items
        .iter()
        .map(|id| match id {
            ItemId::Int(value) => *value,
            ItemId::Text(text) => text.parse().expect("numeric id"),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch,
    Create(Map<String, Value>),
    Update(ItemId, Map<String, Value>),
    Delete { id: ItemId, force: bool },
    Reorder(Vec<ReorderEntry>),
}

/// Backend kept in memory. Failures and delays are scripted per call.
pub struct FakeApi {
    items: Mutex<Vec<OrderedItem<Contact>>>,
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
    fetch_failures: Mutex<VecDeque<ClientError>>,
    reorder_failures: Mutex<VecDeque<ClientError>>,
    create_failures: Mutex<VecDeque<ClientError>>,
    dependents: Mutex<Option<u32>>,
    fetch_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    reorder_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn with_items(items: Vec<OrderedItem<Contact>>) -> Self {
        let next_id = items
            .iter()
            .filter_map(|item| match item.id {
                ItemId::Int(value) => Some(value),
                ItemId::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            items: Mutex::new(items),
            next_id: AtomicI64::new(next_id),
            calls: Mutex::new(Vec::new()),
            fetch_failures: Mutex::new(VecDeque::new()),
            reorder_failures: Mutex::new(VecDeque::new()),
            create_failures: Mutex::new(VecDeque::new()),
            dependents: Mutex::new(None),
            fetch_gates: Mutex::new(VecDeque::new()),
            reorder_gates: Mutex::new(VecDeque::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn reorder_calls(&self) -> Vec<Vec<ReorderEntry>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reorder(entries) => Some(entries),
                _ => None,
            })
            .collect()
    }

    pub fn delete_calls(&self) -> Vec<(ItemId, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { id, force } => Some((id, force)),
                _ => None,
            })
            .collect()
    }

    pub fn server_order(&self) -> Vec<i64> {
        let mut items = self.items.lock().expect("items").clone();
        items.sort_by_key(|item| item.position);
        ids(&items.into_iter().map(|item| item.id).collect::<Vec<_>>())
    }

    pub fn fail_next_fetch(&self, err: ClientError) {
        self.fetch_failures.lock().expect("fetch").push_back(err);
    }

    pub fn fail_next_reorder(&self, err: ClientError) {
        self.reorder_failures.lock().expect("reorder").push_back(err);
    }

    pub fn fail_next_create(&self, err: ClientError) {
        self.create_failures.lock().expect("create").push_back(err);
    }

    /// Non-forced deletes answer with a dependents conflict.
    pub fn block_deletes_with_dependents(&self, count: u32) {
        *self.dependents.lock().expect("dependents") = Some(count);
    }

    /// The next fetch waits until the returned sender fires.
    pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.fetch_gates.lock().expect("gates").push_back(rx);
        tx
    }

    /// The next reorder waits until the returned sender fires.
    pub fn hold_next_reorder(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.reorder_gates.lock().expect("gates").push_back(rx);
        tx
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }
}

#[async_trait]
impl CollectionApi<Contact> for FakeApi {
    fn endpoint(&self) -> &str {
        "directorio"
    }

    async fn fetch_all(&self) -> Result<Vec<OrderedItem<Contact>>, ClientError> {
        self.record(Call::Fetch);
        let gate = self.fetch_gates.lock().expect("gates").pop_front();
        let failure = self.fetch_failures.lock().expect("fetch").pop_front();
        let snapshot = self.items.lock().expect("items").clone();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(snapshot),
        }
    }

    async fn create(&self, fields: ItemFields) -> Result<(), ClientError> {
        self.record(Call::Create(fields.values.clone()));
        if let Some(err) = self.create_failures.lock().expect("create").pop_front() {
            return Err(err);
        }
        let contact: Contact = serde_json::from_value(Value::Object(fields.values))
            .map_err(|err| ClientError::Decode(err.to_string()))?;
        let mut items = self.items.lock().expect("items");
        let position = items.iter().map(|item| item.position).max().unwrap_or(-1) + 1;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        items.push(OrderedItem::new(id, position, contact));
        Ok(())
    }

    async fn update(&self, id: &ItemId, fields: ItemFields) -> Result<(), ClientError> {
        self.record(Call::Update(id.clone(), fields.values.clone()));
        let mut items = self.items.lock().expect("items");
        let item = items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| ClientError::not_found(format!("item {id} not found")))?;
        if let Some(active) = fields.values.get("active").and_then(Value::as_bool) {
            item.active = active;
        }
        if let Some(name) = fields.values.get("name").and_then(Value::as_str) {
            item.payload.name = name.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: &ItemId, force: bool) -> Result<(), ClientError> {
        self.record(Call::Delete {
            id: id.clone(),
            force,
        });
        let mut items = self.items.lock().expect("items");
        let Some(index) = items.iter().position(|item| &item.id == id) else {
            return Err(ClientError::not_found(format!("item {id} not found")));
        };
        if let Some(dependents) = *self.dependents.lock().expect("dependents") {
            if !force {
                return Err(ClientError::HasDependents {
                    id: id.clone(),
                    dependents,
                    message: None,
                });
            }
        }
        items.remove(index);
        Ok(())
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> Result<(), ClientError> {
        self.record(Call::Reorder(entries.to_vec()));
        let gate = self.reorder_gates.lock().expect("gates").pop_front();
        let failure = self.reorder_failures.lock().expect("reorder").pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        let mut items = self.items.lock().expect("items");
        for entry in entries {
            if let Some(item) = items.iter_mut().find(|item| item.id == entry.id) {
                item.position = entry.position;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().expect("toasts").clone()
    }

    pub fn toasts_of(&self, level: ToastLevel) -> Vec<String> {
        self.toasts()
            .into_iter()
            .filter(|toast| toast.level == level)
            .map(|toast| toast.message)
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alerts").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn toast(&self, toast: Toast) {
        self.toasts.lock().expect("toasts").push(toast);
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().expect("alerts").push(message.to_string());
    }
}

/// Answers prompts from a script and remembers what it was asked.
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<ConfirmPrompt>>,
}

impl ScriptedConfirmer {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ConfirmPrompt> {
        self.prompts.lock().expect("prompts").clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        self.prompts.lock().expect("prompts").push(prompt.clone());
        self.answers
            .lock()
            .expect("answers")
            .pop_front()
            .unwrap_or(false)
    }
}
