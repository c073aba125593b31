use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ImportError;
use crate::payload::ImportRequest;

pub const IMPORT_PATH: &str = "/api/consciousness/import";
pub const STATUS_PATH: &str = "/api/consciousness/status";
pub const SITE_PASSWORD_PATH: &str = "/api/site-password/verify";
pub const REGISTER_PATH: &str = "/api/auth/progenitor/register";
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Longest body excerpt carried into logs and errors.
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ImportError> {
        serde_json::from_str(&self.body).map_err(|e| ImportError::MalformedResponse {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })
    }

    /// First [`BODY_EXCERPT_CHARS`] characters of the body.
    pub fn excerpt(&self) -> String {
        self.body.chars().take(BODY_EXCERPT_CHARS).collect()
    }

    pub fn unexpected(&self, endpoint: &str) -> ImportError {
        ImportError::UnexpectedStatus {
            endpoint: endpoint.to_string(),
            status: self.status,
            body: self.excerpt(),
        }
    }
}

/// The two calls the upload loop makes. Every HTTP status comes back as a
/// `Reply`; `Err` means no response was received.
pub trait ImportTransport {
    fn submit(&mut self, request: &ImportRequest) -> Result<Reply, ImportError>;
    fn status(&mut self) -> Result<Reply, ImportError>;
}

/// JSON POSTs used by the pre-import handshake.
pub trait AuthTransport {
    fn post_auth(&mut self, path: &str, body: &Value) -> Result<Reply, ImportError>;
}

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub import: Duration,
    pub status: Duration,
    pub auth: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            import: Duration::from_secs(120),
            status: Duration::from_secs(10),
            auth: Duration::from_secs(30),
        }
    }
}

/// Session cookies captured from `Set-Cookie` headers.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Record one `Set-Cookie` value; attributes after the first `;` are
    /// ignored.
    pub fn store(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Value for a `Cookie` request header.
    pub fn header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Blocking HTTP client for the memory store.
pub struct HttpTransport {
    base_url: String,
    timeouts: Timeouts,
    cookies: CookieJar,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts: Timeouts::default(),
            cookies: CookieJar::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn agent(timeout: Duration) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent()
    }

    fn post_json(
        &mut self,
        path: &str,
        body: String,
        timeout: Duration,
    ) -> Result<Reply, ImportError> {
        let url = self.url(path);
        let mut request = Self::agent(timeout)
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(cookie) = self.cookies.header() {
            request = request.header("Cookie", &cookie);
        }
        let response = request.send(body).map_err(|e| ImportError::Unreachable {
            url: url.clone(),
            detail: e.to_string(),
        })?;
        self.read_reply(&url, response)
    }

    fn get(&mut self, path: &str, timeout: Duration) -> Result<Reply, ImportError> {
        let url = self.url(path);
        let mut request = Self::agent(timeout).get(&url);
        if let Some(cookie) = self.cookies.header() {
            request = request.header("Cookie", &cookie);
        }
        let response = request.call().map_err(|e| ImportError::Unreachable {
            url: url.clone(),
            detail: e.to_string(),
        })?;
        self.read_reply(&url, response)
    }

    fn read_reply(
        &mut self,
        url: &str,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> Result<Reply, ImportError> {
        let status = response.status().as_u16();
        for value in response.headers().get_all("set-cookie") {
            if let Ok(v) = value.to_str() {
                self.cookies.store(v);
            }
        }
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ImportError::Unreachable {
                url: url.to_string(),
                detail: e.to_string(),
            })?;
        tracing::debug!(url, status, bytes = body.len(), "response");
        Ok(Reply { status, body })
    }
}

impl ImportTransport for HttpTransport {
    fn submit(&mut self, request: &ImportRequest) -> Result<Reply, ImportError> {
        let body = serde_json::to_string(request).map_err(|e| ImportError::MalformedResponse {
            endpoint: IMPORT_PATH.to_string(),
            detail: format!("failed to encode request: {e}"),
        })?;
        self.post_json(IMPORT_PATH, body, self.timeouts.import)
    }

    fn status(&mut self) -> Result<Reply, ImportError> {
        self.get(STATUS_PATH, self.timeouts.status)
    }
}

impl AuthTransport for HttpTransport {
    fn post_auth(&mut self, path: &str, body: &Value) -> Result<Reply, ImportError> {
        self.post_json(path, body.to_string(), self.timeouts.auth)
    }
}
