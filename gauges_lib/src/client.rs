//! HTTP client for the Gauges REST API.

use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::credentials::Credentials;
use crate::error::Error;
use crate::http::{HttpRequest, Method, ReqwestTransport, Response, Transport};
use crate::params::{AddShare, AnalyticsQuery, CreateClient, CreateGauge, UpdateGauge, UpdateUser};

pub const API_BASE: &str = "https://secure.gaug.es";

/// Per-gauge analytics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Report {
    Content,
    Referrers,
    Traffic,
    Resolutions,
    Technology,
    Terms,
    Engines,
    Locations,
}

impl Report {
    pub const ALL: [Report; 8] = [
        Report::Content,
        Report::Referrers,
        Report::Traffic,
        Report::Resolutions,
        Report::Technology,
        Report::Terms,
        Report::Engines,
        Report::Locations,
    ];

    /// Path segment under `/gauges/{id}/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Report::Content => "content",
            Report::Referrers => "referrers",
            Report::Traffic => "traffic",
            Report::Resolutions => "resolutions",
            Report::Technology => "technology",
            Report::Terms => "terms",
            Report::Engines => "engines",
            Report::Locations => "locations",
        }
    }

    /// Whether the report accepts `page` / `date`.
    pub fn takes_query(&self) -> bool {
        !matches!(self, Report::Terms)
    }
}

/// Every operation the API exposes, as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint<'a> {
    Me,
    UpdateMe(&'a UpdateUser),
    Clients,
    CreateClient(&'a CreateClient),
    DeleteClient {
        id: &'a str,
    },
    Gauges,
    CreateGauge(&'a CreateGauge),
    Gauge {
        id: &'a str,
    },
    UpdateGauge {
        id: &'a str,
        params: &'a UpdateGauge,
    },
    DeleteGauge {
        id: &'a str,
    },
    Shares {
        id: &'a str,
    },
    AddShare {
        id: &'a str,
        params: &'a AddShare,
    },
    RemoveShare {
        id: &'a str,
        user_id: &'a str,
    },
    Report {
        id: &'a str,
        report: Report,
        query: AnalyticsQuery,
    },
    /// A server-provided link reduced to its path and query.
    Resolved {
        path: String,
        query: Vec<(String, String)>,
    },
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::UpdateMe(_) | Endpoint::UpdateGauge { .. } => Method::Put,
            Endpoint::CreateClient(_) | Endpoint::CreateGauge(_) | Endpoint::AddShare { .. } => {
                Method::Post
            }
            Endpoint::DeleteClient { .. }
            | Endpoint::DeleteGauge { .. }
            | Endpoint::RemoveShare { .. } => Method::Delete,
            _ => Method::Get,
        }
    }

    /// Path with identifiers substituted and percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Me | Endpoint::UpdateMe(_) => "/me".to_string(),
            Endpoint::Clients | Endpoint::CreateClient(_) => "/clients".to_string(),
            Endpoint::DeleteClient { id } => format!("/clients/{}", segment(id)),
            Endpoint::Gauges | Endpoint::CreateGauge(_) => "/gauges".to_string(),
            Endpoint::Gauge { id }
            | Endpoint::UpdateGauge { id, .. }
            | Endpoint::DeleteGauge { id } => format!("/gauges/{}", segment(id)),
            Endpoint::Shares { id } | Endpoint::AddShare { id, .. } => {
                format!("/gauges/{}/shares", segment(id))
            }
            Endpoint::RemoveShare { id, user_id } => {
                format!("/gauges/{}/shares/{}", segment(id), segment(user_id))
            }
            Endpoint::Report { id, report, .. } => {
                format!("/gauges/{}/{}", segment(id), report.as_str())
            }
            Endpoint::Resolved { path, .. } => path.clone(),
        }
    }

    pub fn query(&self) -> Vec<(String, String)> {
        match self {
            Endpoint::Report { report, query, .. } if report.takes_query() => query.to_pairs(),
            Endpoint::Resolved { query, .. } => query.clone(),
            _ => vec![],
        }
    }

    /// JSON body for POST and PUT; `None` otherwise.
    pub fn body(&self) -> Result<Option<Value>, Error> {
        match self {
            Endpoint::UpdateMe(p) => to_body(p),
            Endpoint::CreateClient(p) => to_body(p),
            Endpoint::CreateGauge(p) => to_body(p),
            Endpoint::UpdateGauge { params, .. } => to_body(params),
            Endpoint::AddShare { params, .. } => to_body(params),
            _ => Ok(None),
        }
    }
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

fn to_body<P: Serialize>(params: &P) -> Result<Option<Value>, Error> {
    serde_json::to_value(params)
        .map(Some)
        .map_err(|e| Error::Serialization(e.to_string()))
}

/// Gauges API client.
///
/// Holds credentials, the base URL and a transport; nothing else. Every call
/// is one independent request, and HTTP error statuses come back as a normal
/// [`Response`] for the caller to inspect.
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestTransport> {
    credentials: Credentials,
    base_url: Url,
    user_agent: String,
    transport: T,
}

impl Client<ReqwestTransport> {
    /// Create a client that talks to the live API over `reqwest`.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Ok(Self::with_transport(credentials, ReqwestTransport::new()?))
    }
}

impl<T> Client<T> {
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        let base_url = Url::parse(API_BASE).expect("API_BASE is a valid URL");
        Self {
            credentials,
            base_url,
            user_agent: format!("gauges-rs/{}", crate::VERSION),
            transport,
        }
    }

    /// Point the client at another host (or a path prefix on one).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Error> {
        let url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{} cannot be a base URL", base_url)));
        }
        self.base_url = url;
        Ok(self)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the authenticated request for `endpoint` without sending it.
    pub fn request(&self, endpoint: &Endpoint<'_>) -> Result<HttpRequest, Error> {
        let method = endpoint.method();
        let body = if method.has_body() {
            endpoint.body()?
        } else {
            None
        };
        let query = if method == Method::Get {
            endpoint.query()
        } else {
            vec![]
        };

        if let Endpoint::Report { report, query, .. } = endpoint {
            if !report.takes_query() && !query.to_pairs().is_empty() {
                debug!(report = report.as_str(), "Report takes no page or date; query dropped");
            }
        }

        let mut headers = vec![self.credentials.auth_header()];
        headers.push((ACCEPT.as_str().to_string(), "application/json".to_string()));
        headers.push((USER_AGENT.as_str().to_string(), self.user_agent.clone()));
        if body.is_some() {
            headers.push((CONTENT_TYPE.as_str().to_string(), "application/json".to_string()));
        }

        Ok(HttpRequest {
            method,
            path: endpoint.path(),
            query,
            headers,
            body,
        })
    }

    /// Reduce a link from a previous response to an endpoint on this client's
    /// host. Scheme and host are dropped; path and query are kept. Relative
    /// links resolve to themselves.
    pub fn resolve(&self, link: &str) -> Result<Endpoint<'static>, Error> {
        let parsed = match Url::parse(link) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base_url.join(link)?,
            Err(e) => return Err(e.into()),
        };
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{} has no path to resolve", link)));
        }

        let prefix = self.base_url.path().trim_end_matches('/');
        let mut path = parsed.path();
        if !prefix.is_empty() {
            if let Some(rest) = path.strip_prefix(prefix) {
                if rest.starts_with('/') {
                    path = rest;
                }
            }
        }
        let query = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Endpoint::Resolved {
            path: path.to_string(),
            query,
        })
    }
}

impl<T: Transport> Client<T> {
    /// Send a prepared request through the transport.
    pub async fn execute(&self, request: &HttpRequest) -> Result<Response, Error> {
        let url = request.url(&self.base_url);
        debug!(method = %request.method, path = %request.path, "Gauges API request");
        let res = self
            .transport
            .send(url, request)
            .await
            .inspect_err(|e| {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %e,
                    "Gauges API transport failure"
                )
            })?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = res.status,
            "Gauges API response"
        );
        trace!(body = %res.body, "Gauges API response body");
        Ok(res)
    }

    pub async fn call(&self, endpoint: Endpoint<'_>) -> Result<Response, Error> {
        let request = self.request(&endpoint)?;
        self.execute(&request).await
    }

    /// Current user.
    pub async fn me(&self) -> Result<Response, Error> {
        self.call(Endpoint::Me).await
    }

    pub async fn update_me(&self, params: &UpdateUser) -> Result<Response, Error> {
        self.call(Endpoint::UpdateMe(params)).await
    }

    /// API clients (keys) on the account.
    pub async fn clients(&self) -> Result<Response, Error> {
        self.call(Endpoint::Clients).await
    }

    pub async fn create_client(&self, params: &CreateClient) -> Result<Response, Error> {
        self.call(Endpoint::CreateClient(params)).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<Response, Error> {
        self.call(Endpoint::DeleteClient { id }).await
    }

    /// Gauges the user can access. Follow `urls` links for further pages.
    pub async fn gauges(&self) -> Result<Response, Error> {
        self.call(Endpoint::Gauges).await
    }

    pub async fn create_gauge(&self, params: &CreateGauge) -> Result<Response, Error> {
        self.call(Endpoint::CreateGauge(params)).await
    }

    pub async fn gauge(&self, id: &str) -> Result<Response, Error> {
        self.call(Endpoint::Gauge { id }).await
    }

    pub async fn update_gauge(&self, id: &str, params: &UpdateGauge) -> Result<Response, Error> {
        self.call(Endpoint::UpdateGauge { id, params }).await
    }

    pub async fn delete_gauge(&self, id: &str) -> Result<Response, Error> {
        self.call(Endpoint::DeleteGauge { id }).await
    }

    /// Users and pending invites with access to a gauge.
    pub async fn shares(&self, id: &str) -> Result<Response, Error> {
        self.call(Endpoint::Shares { id }).await
    }

    /// Share a gauge with an existing user or invite an email address.
    pub async fn share(&self, id: &str, params: &AddShare) -> Result<Response, Error> {
        self.call(Endpoint::AddShare { id, params }).await
    }

    pub async fn unshare(&self, id: &str, user_id: &str) -> Result<Response, Error> {
        self.call(Endpoint::RemoveShare { id, user_id }).await
    }

    /// Any analytics report for a gauge.
    pub async fn report(
        &self,
        id: &str,
        report: Report,
        query: AnalyticsQuery,
    ) -> Result<Response, Error> {
        self.call(Endpoint::Report { id, report, query }).await
    }

    /// Top content (paths) for a day.
    pub async fn content(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Content, query).await
    }

    pub async fn referrers(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Referrers, query).await
    }

    pub async fn traffic(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Traffic, query).await
    }

    /// Browser and screen resolutions.
    pub async fn resolutions(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Resolutions, query).await
    }

    /// Browsers and platforms.
    pub async fn technology(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Technology, query).await
    }

    /// Search terms.
    pub async fn terms(&self, id: &str) -> Result<Response, Error> {
        self.report(id, Report::Terms, AnalyticsQuery::default())
            .await
    }

    /// Search engines.
    pub async fn engines(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Engines, query).await
    }

    pub async fn locations(&self, id: &str, query: AnalyticsQuery) -> Result<Response, Error> {
        self.report(id, Report::Locations, query).await
    }

    /// GET a link taken from a previous response (`urls.older`, `urls.self`, ...)
    /// against this client's host.
    pub async fn resolve_by_url(&self, link: &str) -> Result<Response, Error> {
        let endpoint = self.resolve(link)?;
        self.call(endpoint).await
    }
}
