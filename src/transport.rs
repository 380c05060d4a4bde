//! Outbound HTTP transport shared by all providers.
//!
//! Every provider talks to its channel through [`HttpService`], which wraps a
//! [`ClientWithMiddleware`] and turns non-success statuses into
//! [`HttpError::Status`] with the response body attached.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// Server answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to read the response body.
    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {source}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Failed to encode a form body.
    #[error("Failed to encode form body: {0}")]
    EncodeForm(#[source] serde_urlencoded::ser::Error),
}

/// Request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub method: Method,
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
    /// Overrides the service default when set.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    pub fn bearer_auth(self, token: &SecretString) -> Self {
        let value = format!("Bearer {}", token.expose_secret());
        self.header(AUTHORIZATION.as_str(), value)
    }

    pub fn basic_auth(self, user: &str, password: &SecretString) -> Self {
        let raw = format!("{}:{}", user, password.expose_secret());
        let value = format!("Basic {}", BASE64.encode(raw));
        self.header(AUTHORIZATION.as_str(), value)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Decoded response.
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    pub data: T,
    pub status: u16,
    pub headers: HashMap<String, String>,
}

/// HTTP client used by every provider.
#[derive(Clone)]
pub struct HttpService {
    client: ClientWithMiddleware,
    default_timeout: Duration,
}

impl std::fmt::Debug for HttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpService")
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl HttpService {
    /// Build a client. Request logging middleware is installed with the
    /// `tracing` feature.
    pub fn new(default_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        let builder = ClientBuilder::new(client);
        #[cfg(feature = "tracing")]
        let builder = builder.with(logging::LoggingMiddleware);

        Ok(Self {
            client: builder.build(),
            default_timeout,
        })
    }

    /// Use a caller-supplied client with middleware.
    pub fn with_client(client: ClientWithMiddleware, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Send a request and decode the JSON body into `T`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "HttpService::request",
            skip_all,
            fields(method = %req.method, host = req.url.host_str().unwrap_or_default())
        )
    )]
    pub async fn request<T: DeserializeOwned>(
        &self,
        req: HttpRequest,
    ) -> Result<HttpResponse<T>, HttpError> {
        let mut url = req.url;
        if !req.params.is_empty() {
            url.query_pairs_mut().extend_pairs(req.params.iter());
        }

        let mut builder = self
            .client
            .request(req.method, url)
            .timeout(req.timeout.unwrap_or(self.default_timeout));

        for (key, value) in &req.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder = match req.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Form(fields)) => {
                let encoded = serde_urlencoded::to_string(&fields).map_err(HttpError::EncodeForm)?;
                builder
                    .header(CONTENT_TYPE.as_str(), "application/x-www-form-urlencoded")
                    .body(encoded)
            }
            None => builder,
        };

        let response = builder.send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(HttpError::ReadBody)?;

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data = serde_json::from_str::<T>(&body)
            .map_err(|source| HttpError::Deserialize { source, body })?;

        #[cfg(feature = "tracing")]
        Span::current().set_status(Status::Ok);

        Ok(HttpResponse {
            data,
            status: status.as_u16(),
            headers,
        })
    }
}

#[cfg(feature = "tracing")]
mod logging {
    use http::Extensions;
    use reqwest::{Request, Response};
    use reqwest_middleware::{Middleware, Next};
    use tracing::{debug, warn};

    /// Logs every outbound request and its outcome. Never touches payloads.
    pub(super) struct LoggingMiddleware;

    #[async_trait::async_trait]
    impl Middleware for LoggingMiddleware {
        async fn handle(
            &self,
            req: Request,
            extensions: &mut Extensions,
            next: Next<'_>,
        ) -> reqwest_middleware::Result<Response> {
            let method = req.method().clone();
            let path = req.url().path().to_string();
            debug!(method = %method, path = %path, "HTTP request");

            let result = next.run(req, extensions).await;
            match &result {
                Ok(response) => {
                    debug!(method = %method, path = %path, status = response.status().as_u16(), "HTTP response")
                }
                Err(err) => warn!(method = %method, path = %path, error = %err, "HTTP error"),
            }
            result
        }
    }
}
