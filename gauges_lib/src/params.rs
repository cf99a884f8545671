//! Typed request parameters.
//!
//! Unset optional fields are left out of the request entirely rather than
//! sent as `null`.

use chrono::NaiveDate;
use serde::Serialize;

/// Body for `PUT /me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body for `POST /clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateClient {
    /// What the key is used for (e.g. Campfire, GitHub, HipChat).
    pub description: String,
}

impl CreateClient {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Body for `POST /gauges`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGauge {
    pub title: String,
    /// Time zone stats are tracked in, e.g. `Eastern Time (US & Canada)`.
    pub tz: String,
    /// Domain of the site, e.g. `railstips.org`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_value: Option<String>,
    /// Comma-separated hosts allowed to report to this gauge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_hosts: Option<String>,
}

impl CreateGauge {
    pub fn new(title: impl Into<String>, tz: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tz: tz.into(),
            service_value: None,
            allowed_hosts: None,
        }
    }

    pub fn service_value(mut self, value: impl Into<String>) -> Self {
        self.service_value = Some(value.into());
        self
    }

    pub fn allowed_hosts(mut self, hosts: impl Into<String>) -> Self {
        self.allowed_hosts = Some(hosts.into());
        self
    }
}

/// Body for `PUT /gauges/{id}`; only the fields to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateGauge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_hosts: Option<String>,
}

/// Body for `POST /gauges/{id}/shares`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddShare {
    pub email: String,
}

impl AddShare {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Query for the per-gauge analytics reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsQuery {
    pub page: Option<u32>,
    pub date: Option<NaiveDate>,
}

impl AnalyticsQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            date: None,
        }
    }

    pub fn date(date: NaiveDate) -> Self {
        Self {
            page: None,
            date: Some(date),
        }
    }

    /// Query pairs in a fixed order (`page`, then `date` as `YYYY-MM-DD`).
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![];
        if let Some(p) = self.page {
            pairs.push(("page".to_string(), p.to_string()));
        }
        if let Some(d) = self.date {
            pairs.push(("date".to_string(), d.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}
