//! HTTP executor: signs, sends, classifies, retries.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use xpost_oauth::encode_pairs;

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::error::{XpostError, XpostResult};
use crate::request::{Body, RequestDescriptor};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::signer::AuthContext;

/// X API client.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    stream_http: Client,
    config: ClientConfig,
    auth: AuthContext,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client from configuration and resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns [`XpostError::Config`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, credentials: Credentials) -> XpostResult<Self> {
        let user_agent = format!("xpost/{}", env!("CARGO_PKG_VERSION"));

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&user_agent)
            .build()?;

        // Streams stay open indefinitely; idle detection happens while reading.
        let stream_http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&user_agent)
            .build()?;

        let auth = AuthContext::new(credentials, &config, http.clone());
        let retry = RetryPolicy::from(&config.retry);

        Ok(Self {
            http,
            stream_http,
            config,
            auth,
            retry,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub const fn http(&self) -> &Client {
        &self.http
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub const fn auth_mut(&mut self) -> &mut AuthContext {
        &mut self.auth
    }

    /// Send `request`, retrying transient failures and rate limiting up to
    /// the configured attempt ceiling. A 2xx with an empty body yields `{}`.
    ///
    /// # Errors
    ///
    /// The classified error of the last attempt.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&mut self, request: &RequestDescriptor) -> XpostResult<Value> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, "Making X API request");

            let error = match self.send_once(request).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match self.retry.decide(&error, attempt) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Retrying X API request"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry => return Err(error),
            }
        }
    }

    async fn send_once(&mut self, request: &RequestDescriptor) -> XpostResult<Value> {
        let http = self.http.clone();
        let response = self.dispatch(&http, request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        classify(status, &headers, &bytes)
    }

    async fn dispatch(&mut self, http: &Client, request: &RequestDescriptor) -> XpostResult<Response> {
        let base_url = request.base_url(&self.config);
        let authorization = self.auth.authorization(request, &base_url).await?;

        let mut builder = http
            .request(request.method.clone(), request.url(&self.config))
            .header(AUTHORIZATION, authorization);

        builder = match &request.body {
            Body::None => builder,
            Body::Json(value) => builder.json(value),
            Body::Form(fields) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_pairs(fields)),
        };

        Ok(builder.send().await?)
    }

    /// Open a long-lived streaming connection. Never retried; a non-success
    /// status is classified before any record is read.
    ///
    /// # Errors
    ///
    /// Missing credentials, connection failure, or the classified status.
    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn open_stream(&mut self, request: &RequestDescriptor) -> XpostResult<Response> {
        let http = self.stream_http.clone();
        let response = self.dispatch(&http, request).await?;
        let status = response.status();

        if status.is_success() {
            debug!(%status, "Stream connected");
            return Ok(response);
        }

        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        match classify(status, &headers, &bytes) {
            Err(e) => Err(e),
            Ok(_) => Err(XpostError::MalformedResponse(format!(
                "unexpected stream status {status}"
            ))),
        }
    }
}

/// Rate limit information from X API headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// Remaining requests in the current window
    pub remaining: Option<u32>,

    /// Unix timestamp when the window resets
    pub reset: Option<u64>,

    /// Seconds from a `retry-after` header
    pub retry_after: Option<u64>,
}

impl RateLimitInfo {
    /// Parse rate limit info from response headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        Self {
            remaining: number("x-rate-limit-remaining").and_then(|v: u64| u32::try_from(v).ok()),
            reset: number("x-rate-limit-reset"),
            retry_after: number("retry-after"),
        }
    }

    /// Seconds to wait, preferring `retry-after` over the window reset.
    #[must_use]
    pub fn wait_secs(&self) -> Option<u64> {
        self.retry_after
            .or_else(|| self.time_until_reset().map(|d| d.as_secs()))
    }

    /// Get the duration until the window resets.
    #[must_use]
    pub fn time_until_reset(&self) -> Option<Duration> {
        let reset = self.reset?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        (reset > now).then(|| Duration::from_secs(reset - now))
    }
}

/// Map a raw response onto a JSON value or a classified error.
///
/// # Errors
///
/// Classified non-success statuses, or [`XpostError::MalformedResponse`] for
/// a 2xx body that is not JSON.
pub fn classify(status: StatusCode, headers: &HeaderMap, bytes: &[u8]) -> XpostResult<Value> {
    let rate_limit = RateLimitInfo::from_headers(headers);
    if rate_limit.remaining == Some(0) {
        debug!(reset = ?rate_limit.reset, "Rate limit exhausted");
    }

    if status.is_success() {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(json!({}));
        }
        return serde_json::from_slice(bytes)
            .map_err(|e| XpostError::MalformedResponse(format!("{status}: {e}")));
    }

    let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
        rate_limit.wait_secs()
    } else {
        None
    };

    Err(XpostError::from_status(
        status.as_u16(),
        error_message(status, bytes),
        retry_after,
    ))
}

/// Best human-readable message from an X error body.
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    let Ok(body) = serde_json::from_slice::<Value>(bytes) else {
        let text = String::from_utf8_lossy(bytes).trim().to_string();
        return if text.is_empty() {
            status.to_string()
        } else {
            text
        };
    };

    let pick = |v: &Value| v.as_str().map(str::to_string);
    body.get("detail")
        .and_then(pick)
        .or_else(|| body.get("title").and_then(pick))
        .or_else(|| body.pointer("/errors/0/message").and_then(pick))
        .or_else(|| body.pointer("/errors/0/detail").and_then(pick))
        .or_else(|| body.get("error_description").and_then(pick))
        .or_else(|| body.get("error").and_then(pick))
        .unwrap_or_else(|| body.to_string())
}
