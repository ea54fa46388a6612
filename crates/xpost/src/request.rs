//! Request descriptors: everything needed to sign and send one API call.

use reqwest::Method;
use serde_json::Value;
use xpost_oauth::encode_pairs;

use crate::config::ClientConfig;

/// Which credential variant signs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// OAuth 1.0a user context
    OAuth1,
    /// App-only bearer token
    Bearer,
    /// OAuth 2.0 PKCE user token
    OAuth2,
}

impl AuthScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OAuth1 => "oauth1",
            Self::Bearer => "bearer",
            Self::OAuth2 => "oauth2",
        }
    }
}

/// API generation a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    /// `https://api.x.com/2/...`
    V2,
    /// `https://api.twitter.com/1.1/...`
    V1,
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    None,
    /// Sent as `application/json`; never part of an OAuth 1.0a signature.
    Json(Value),
    /// Sent as `application/x-www-form-urlencoded`; signed with the query.
    Form(Vec<(String, String)>),
}

/// An immutable description of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub base: ApiBase,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
    pub auth: AuthScheme,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            method,
            base: ApiBase::V2,
            path: path.into(),
            query: Vec::new(),
            body: Body::None,
            auth,
        }
    }

    pub fn get(path: impl Into<String>, auth: AuthScheme) -> Self {
        Self::new(Method::GET, path, auth)
    }

    pub fn post(path: impl Into<String>, auth: AuthScheme) -> Self {
        Self::new(Method::POST, path, auth)
    }

    pub fn put(path: impl Into<String>, auth: AuthScheme) -> Self {
        Self::new(Method::PUT, path, auth)
    }

    pub fn delete(path: impl Into<String>, auth: AuthScheme) -> Self {
        Self::new(Method::DELETE, path, auth)
    }

    #[must_use]
    pub const fn v1(mut self) -> Self {
        self.base = ApiBase::V1;
        self
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn params(mut self, params: &[(&str, &str)]) -> Self {
        self.query
            .extend(params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        self
    }

    /// Replace any existing value for `key`.
    pub fn set_param(&mut self, key: &str, value: impl ToString) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.to_string()));
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    #[must_use]
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    /// URL without query string; this is what OAuth 1.0a signs.
    #[must_use]
    pub fn base_url(&self, config: &ClientConfig) -> String {
        let root = match self.base {
            ApiBase::V2 => config.api_base(),
            ApiBase::V1 => config.v1_base(),
        };
        format!("{root}{}", self.path)
    }

    /// Full URL with the query encoded exactly as it is signed.
    #[must_use]
    pub fn url(&self, config: &ClientConfig) -> String {
        let base = self.base_url(config);
        if self.query.is_empty() {
            base
        } else {
            format!("{base}?{}", encode_pairs(&self.query))
        }
    }

    /// Parameters that take part in an OAuth 1.0a signature.
    #[must_use]
    pub fn signing_params(&self) -> Vec<(String, String)> {
        let mut params = self.query.clone();
        if let Body::Form(fields) = &self.body {
            params.extend(fields.iter().cloned());
        }
        params
    }
}
