//! Gauges web analytics API client library.
//!
//! Provides a client for the Gauges REST API: account, API clients, gauges,
//! shares, and per-gauge analytics reports. Responses are returned as raw JSON
//! with their HTTP status; failures such as 401 or 422 are data, not errors.

pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod mock;
pub mod models;
pub mod params;
pub mod secret;

pub use client::{Client, Endpoint, Report, API_BASE};
pub use credentials::{resolve_credentials, AuthMode, CredentialSource, Credentials};
pub use error::Error;
pub use http::{HttpRequest, Method, ReqwestTransport, Response, Transport};
pub use params::{AddShare, AnalyticsQuery, CreateClient, CreateGauge, UpdateGauge, UpdateUser};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
