use std::{collections::HashMap, fs, path::Path, time::Duration};

use shared::{domain::ResourceKind, protocol::ReorderShape};
use tracing::warn;

use crate::{
    api::{EndpointOptions, ReorderMethod},
    reorder::RollbackPolicy,
};

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub request_timeout_secs: u64,
    pub reorder_method: ReorderMethod,
    pub reorder_key: String,
    pub reorder_shape: ReorderShape,
    pub position_base: i64,
    pub rollback_on_reorder_failure: bool,
    pub endpoints: HashMap<ResourceKind, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000/api".into(),
            token: None,
            request_timeout_secs: 15,
            reorder_method: ReorderMethod::Put,
            reorder_key: "items".into(),
            reorder_shape: ReorderShape::Pairs,
            position_base: 0,
            rollback_on_reorder_failure: true,
            endpoints: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn endpoint_path(&self, kind: ResourceKind) -> &str {
        self.endpoints
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_path())
    }

    pub fn endpoint_options(&self) -> EndpointOptions {
        EndpointOptions {
            reorder_method: self.reorder_method,
            reorder_key: self.reorder_key.clone(),
            reorder_shape: self.reorder_shape,
            position_base: self.position_base,
            timeout: Duration::from_secs(self.request_timeout_secs),
            ..EndpointOptions::default()
        }
    }

    pub fn rollback_policy(&self) -> RollbackPolicy {
        if self.rollback_on_reorder_failure {
            RollbackPolicy::RestoreSnapshot
        } else {
            RollbackPolicy::KeepLocal
        }
    }

    /// Overlays keys from a TOML document. Unknown keys and values of the
    /// wrong type are skipped.
    pub fn apply_toml(&mut self, raw: &str) {
        let table = match raw.parse::<toml::Table>() {
            Ok(table) => table,
            Err(err) => {
                warn!(error = %err, "ignoring unparsable dashboard config");
                return;
            }
        };

        if let Some(v) = table.get("api_url").and_then(|v| v.as_str()) {
            self.api_url = v.to_string();
        }
        if let Some(v) = table.get("token").and_then(|v| v.as_str()) {
            self.token = Some(v.to_string());
        }
        if let Some(v) = table
            .get("request_timeout_secs")
            .and_then(|v| v.as_integer())
            .and_then(|v| u64::try_from(v).ok())
        {
            self.request_timeout_secs = v;
        }
        if let Some(v) = table
            .get("reorder_method")
            .and_then(|v| v.as_str())
            .and_then(|v| v.parse().ok())
        {
            self.reorder_method = v;
        }
        if let Some(v) = table.get("reorder_key").and_then(|v| v.as_str()) {
            self.reorder_key = v.to_string();
        }
        if let Some(v) = table
            .get("reorder_shape")
            .and_then(|v| v.as_str())
            .and_then(parse_shape)
        {
            self.reorder_shape = v;
        }
        if let Some(v) = table.get("position_base").and_then(|v| v.as_integer()) {
            self.position_base = v;
        }
        if let Some(v) = table
            .get("rollback_on_reorder_failure")
            .and_then(|v| v.as_bool())
        {
            self.rollback_on_reorder_failure = v;
        }
        if let Some(endpoints) = table.get("endpoints").and_then(|v| v.as_table()) {
            for kind in [
                ResourceKind::Contacts,
                ResourceKind::StayTypes,
                ResourceKind::DocumentTypes,
                ResourceKind::Sections,
            ] {
                if let Some(path) = endpoints.get(kind.label()).and_then(|v| v.as_str()) {
                    self.endpoints.insert(kind, path.to_string());
                }
            }
        }
    }

    /// Overlays environment variables. `APP__*` names win over the short ones.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DASHBOARD_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("APP__API_URL") {
            self.api_url = v;
        }

        if let Some(v) = lookup("DASHBOARD_TOKEN") {
            self.token = Some(v);
        }
        if let Some(v) = lookup("APP__TOKEN") {
            self.token = Some(v);
        }

        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }

        if let Some(v) = lookup("APP__REORDER_METHOD") {
            if let Ok(parsed) = v.parse::<ReorderMethod>() {
                self.reorder_method = parsed;
            }
        }

        if let Some(v) = lookup("APP__ROLLBACK_ON_REORDER_FAILURE") {
            if let Ok(parsed) = v.trim().parse::<bool>() {
                self.rollback_on_reorder_failure = parsed;
            }
        }
    }
}

fn parse_shape(raw: &str) -> Option<ReorderShape> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pairs" => Some(ReorderShape::Pairs),
        "ids" => Some(ReorderShape::Ids),
        _ => None,
    }
}

/// Defaults, then the config file (if present), then the environment.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_toml(&raw);
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings
}
