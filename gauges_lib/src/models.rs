//! Typed views over common response bodies.
//!
//! Responses are returned as raw JSON; these structs are an opt-in way to
//! read them (see [`Response::decode`](crate::Response::decode)). Fields the
//! server omits fall back to defaults, and unknown fields are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// `status: "fail"` body returned with 401 and 404.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Failure {
    pub status: String,
    pub message: String,
}

/// Body returned with 422.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidationErrors {
    /// Field name to message, e.g. `tz` -> `is not included in the list`.
    pub errors: BTreeMap<String, String>,
    /// Human-readable messages, in server order.
    #[serde(default)]
    pub full_messages: Vec<String>,
}

/// Navigation and sub-resource links (`urls` object).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Urls(pub BTreeMap<String, Value>);

impl Urls {
    /// The link for `key`, if present and not null.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Reference to a gauge from a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GaugeRef {
    pub id: String,
    pub owner: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gauges: Vec<GaugeRef>,
    pub urls: Urls,
}

/// A registered API client (key) on the account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiClient {
    pub key: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub urls: Urls,
}

/// Views and people for one bucket (hour, day, month, or all time).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Traffic {
    pub views: u64,
    pub people: u64,
    pub date: Option<String>,
    pub hour: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Gauge {
    pub id: String,
    pub title: String,
    pub tz: String,
    pub service_value: Option<String>,
    pub allowed_hosts: Option<String>,
    pub creator_id: Option<String>,
    pub now_in_zone: Option<String>,
    pub enabled: bool,
    pub all_time: Option<Traffic>,
    pub today: Option<Traffic>,
    pub yesterday: Option<Traffic>,
    pub recent_hours: Vec<Traffic>,
    pub recent_days: Vec<Traffic>,
    pub recent_months: Vec<Traffic>,
    pub urls: Urls,
}

/// A user or pending invite with access to a gauge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Share {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `user` or `invite`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub urls: Urls,
}
