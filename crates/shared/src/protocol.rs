use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ItemId;

/// List endpoints answer either with a bare array or with `{ "data": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(items) => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: ItemId,
    pub position: i64,
}

/// Element shape a reorder endpoint expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderShape {
    #[default]
    Pairs,
    Ids,
}

/// Builds `{ <key>: [...] }` for the reorder endpoint.
pub fn reorder_body(key: &str, shape: ReorderShape, entries: &[ReorderEntry]) -> Value {
    let items = match shape {
        ReorderShape::Pairs => entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "id": entry.id,
                    "position": entry.position,
                })
            })
            .collect::<Vec<_>>(),
        ReorderShape::Ids => entries
            .iter()
            .map(|entry| serde_json::json!(entry.id))
            .collect::<Vec<_>>(),
    };
    let mut body = Map::new();
    body.insert(key.to_string(), Value::Array(items));
    Value::Object(body)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleActiveBody {
    pub active: bool,
}
