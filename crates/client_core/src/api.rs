//! Typed access to one REST collection endpoint.

use std::{marker::PhantomData, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::{
    domain::{ItemId, OrderedItem, Searchable},
    error::ErrorBody,
    protocol::{reorder_body, ListEnvelope, ReorderEntry, ReorderShape, ToggleActiveBody},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

/// Bound shared by every entity payload the client can hold.
pub trait Payload: DeserializeOwned + Searchable + Clone + Send + Sync + 'static {}

impl<T> Payload for T where T: DeserializeOwned + Searchable + Clone + Send + Sync + 'static {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub field: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fields of a create/update request, plus any files picked in the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFields {
    pub values: Map<String, Value>,
    pub attachments: Vec<Attachment>,
}

impl ItemFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, ClientError> {
        match serde_json::to_value(value).map_err(|err| ClientError::Decode(err.to_string()))? {
            Value::Object(values) => Ok(Self {
                values,
                attachments: Vec::new(),
            }),
            other => Err(ClientError::Decode(format!(
                "expected an object of fields, got {other}"
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn toggled(active: bool) -> Self {
        let mut fields = Self::new();
        if let Ok(Value::Object(values)) = serde_json::to_value(ToggleActiveBody { active }) {
            fields.values = values;
        }
        fields
    }

    pub fn is_multipart(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Strings go in as is; everything else is JSON-encoded text. Nulls are
    /// left out.
    pub fn into_form(self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (key, value) in self.values {
            let text = match &value {
                Value::Null => continue,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            form = form.text(key, text);
        }
        for attachment in self.attachments {
            let mut part = Part::bytes(attachment.bytes).file_name(attachment.filename);
            if let Some(mime_type) = attachment.mime_type.as_deref() {
                part = part
                    .mime_str(mime_type)
                    .map_err(|err| ClientError::Attachment(err.to_string()))?;
            }
            form = form.part(attachment.field, part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderMethod {
    Post,
    #[default]
    Put,
}

impl FromStr for ReorderMethod {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            other => Err(format!("unsupported reorder method '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOptions {
    pub reorder_method: ReorderMethod,
    pub reorder_path: String,
    pub reorder_key: String,
    pub reorder_shape: ReorderShape,
    pub position_base: i64,
    pub force_param: String,
    pub timeout: Duration,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            reorder_method: ReorderMethod::Put,
            reorder_path: "reorder".into(),
            reorder_key: "items".into(),
            reorder_shape: ReorderShape::Pairs,
            position_base: 0,
            force_param: "forzar".into(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Source of the bearer token. Session storage and redirects live outside
/// this crate; a 401 is reported through `on_unauthorized`.
pub trait AuthSession: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    fn on_unauthorized(&self) {}
}

pub struct StaticToken(pub Option<String>);

impl AuthSession for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[async_trait]
pub trait CollectionApi<P: Payload>: Send + Sync {
    fn endpoint(&self) -> &str;

    /// First position number the reorder endpoint expects.
    fn position_base(&self) -> i64 {
        0
    }

    async fn fetch_all(&self) -> Result<Vec<OrderedItem<P>>, ClientError>;
    async fn create(&self, fields: ItemFields) -> Result<(), ClientError>;
    async fn update(&self, id: &ItemId, fields: ItemFields) -> Result<(), ClientError>;
    async fn delete(&self, id: &ItemId, force: bool) -> Result<(), ClientError>;
    async fn reorder(&self, entries: &[ReorderEntry]) -> Result<(), ClientError>;
}

pub struct HttpCollectionApi<P> {
    http: Client,
    collection_url: Url,
    endpoint: String,
    options: EndpointOptions,
    auth: Arc<dyn AuthSession>,
    _payload: PhantomData<fn() -> P>,
}

impl<P> HttpCollectionApi<P> {
    pub fn new(
        base_url: &str,
        endpoint: &str,
        options: EndpointOptions,
        auth: Arc<dyn AuthSession>,
    ) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url, endpoint, options, auth)
    }

    pub fn with_client(
        http: Client,
        base_url: &str,
        endpoint: &str,
        options: EndpointOptions,
        auth: Arc<dyn AuthSession>,
    ) -> Result<Self, ClientError> {
        let collection_url = collection_url(base_url, endpoint)?;
        Ok(Self {
            http,
            collection_url,
            endpoint: endpoint.trim_matches('/').to_string(),
            options,
            auth,
            _payload: PhantomData,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn url_for(&self, segment: &str) -> Result<Url, ClientError> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.collection_url.to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.options.timeout);
        match self.auth.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request; only transport failures and 401 are errors here.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorize(request).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(endpoint = %self.endpoint, "backend rejected credentials");
            self.auth.on_unauthorized();
            return Err(ClientError::Unauthorized);
        }
        Ok(response)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.send(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, body) = read_rejection(response).await;
        Err(ClientError::rejected(status, &body))
    }
}

fn collection_url(base_url: &str, endpoint: &str) -> Result<Url, ClientError> {
    let mut base = Url::parse(base_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let endpoint = endpoint.trim_matches('/');
    if endpoint.is_empty() {
        return Err(ClientError::InvalidUrl("empty collection endpoint".into()));
    }
    Ok(base.join(endpoint)?)
}

async fn read_rejection(response: Response) -> (u16, ErrorBody) {
    let status = response.status().as_u16();
    let raw = response.text().await.unwrap_or_default();
    (status, ErrorBody::parse(&raw).unwrap_or_default())
}

#[async_trait]
impl<P: Payload> CollectionApi<P> for HttpCollectionApi<P> {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn position_base(&self) -> i64 {
        self.options.position_base
    }

    async fn fetch_all(&self) -> Result<Vec<OrderedItem<P>>, ClientError> {
        let response = self
            .execute(self.http.get(self.collection_url.clone()))
            .await?;
        let envelope: ListEnvelope<OrderedItem<P>> = response.json().await?;
        let items = envelope.into_items();
        debug!(endpoint = %self.endpoint, count = items.len(), "fetched collection");
        Ok(items)
    }

    async fn create(&self, fields: ItemFields) -> Result<(), ClientError> {
        let request = self.http.post(self.collection_url.clone());
        let request = if fields.is_multipart() {
            request.multipart(fields.into_form()?)
        } else {
            request.json(&fields.values)
        };
        self.execute(request).await?;
        Ok(())
    }

    async fn update(&self, id: &ItemId, fields: ItemFields) -> Result<(), ClientError> {
        let request = self.http.put(self.url_for(&id.to_string())?);
        let request = if fields.is_multipart() {
            request.multipart(fields.into_form()?)
        } else {
            request.json(&fields.values)
        };
        self.execute(request).await?;
        Ok(())
    }

    async fn delete(&self, id: &ItemId, force: bool) -> Result<(), ClientError> {
        let mut url = self.url_for(&id.to_string())?;
        if force {
            url.query_pairs_mut()
                .append_pair(&self.options.force_param, "true");
        }
        let response = self.send(self.http.delete(url)).await?;
        if response.status().is_success() {
            return Ok(());
        }
        let (status, body) = read_rejection(response).await;
        match body.dependents_count {
            Some(dependents) if !force => Err(ClientError::HasDependents {
                id: id.clone(),
                dependents,
                message: body.human_message(),
            }),
            _ => Err(ClientError::rejected(status, &body)),
        }
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> Result<(), ClientError> {
        let url = self.url_for(&self.options.reorder_path)?;
        let body = reorder_body(
            &self.options.reorder_key,
            self.options.reorder_shape,
            entries,
        );
        let request = match self.options.reorder_method {
            ReorderMethod::Post => self.http.post(url),
            ReorderMethod::Put => self.http.put(url),
        };
        self.execute(request.json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
