//! The authenticated request primitive.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use hx_core::ValidationError;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::ApiError;

/// Root of the Harvest v2 API.
pub const DEFAULT_BASE_URL: &str = "https://api.harvestapp.com/api/v2";
/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ACCOUNT_HEADER: &str = "Harvest-Account-ID";
const USER_AGENT: &str = concat!("hx/", env!("CARGO_PKG_VERSION"));

/// Query parameters of a request, sent in key order.
pub type Params = BTreeMap<&'static str, String>;

/// HTTP methods used against the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Patch,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bearer token and account id for one Harvest account.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    account_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl Credentials {
    /// Validates and stores the credentials.
    ///
    /// Both values are trimmed; empty or whitespace-only values are rejected.
    pub fn new(
        token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ValidationError::Empty { field: "token" });
        }
        let account_id = account_id.into().trim().to_string();
        if account_id.is_empty() {
            return Err(ValidationError::Empty {
                field: "account ID",
            });
        }
        Ok(Self { token, account_id })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

/// Sends one request and decodes the JSON answer.
///
/// Implementations must fail with [`ApiError::Status`] for any response other
/// than 200 OK, keeping the response body. They never retry.
pub trait Transport {
    fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> impl Future<Output = Result<Value, ApiError>>;
}

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP transport backed by `reqwest`.
///
/// Authentication headers are fixed when the client is built; clones share
/// the underlying connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(credentials: &Credentials, options: HttpOptions) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let account = HeaderValue::from_str(&credentials.account_id).map_err(|_| {
            ApiError::InvalidHeader {
                header: ACCOUNT_HEADER,
            }
        })?;
        headers.insert(ACCOUNT_HEADER, account);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
            .map_err(|_| ApiError::InvalidHeader {
                header: "Authorization",
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: options.base_url,
        })
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<Value, ApiError> {
        let url = join_url(&self.base_url, endpoint);
        let request = match method {
            Method::Get => self.http.get(&url),
            Method::Patch => self.http.patch(&url),
        };

        let response = request.query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            tracing::debug!(%method, endpoint, status = status.as_u16(), %body, "request rejected");
            return Err(ApiError::Status {
                method,
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// Joins base URL and endpoint with exactly one slash between them.
fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
