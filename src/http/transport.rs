use crate::config::Config;
use crate::http::error::BoxError;
use crate::http::request::ApiRequest;
use futures::future::BoxFuture;
use reqwest::header::{HeaderName, HeaderValue};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub const HEADER_TOKEN: &str = "x-docbasetoken";

/// Sends one request and hands back the raw response. Implementations must
/// not modify the request they are given.
pub trait Transport: Send + Sync {
    fn round_trip<'a>(
        &'a self,
        req: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<reqwest::Response, BoxError>>;
}

impl Transport for reqwest::Client {
    fn round_trip<'a>(
        &'a self,
        req: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<reqwest::Response, BoxError>> {
        Box::pin(async move {
            let mut builder = self
                .request(req.method().clone(), req.url().clone())
                .headers(req.headers().clone());
            if let Some(body) = req.body() {
                builder = builder.body(body.clone());
            }
            // The dispatcher renders the (sanitized) URL itself.
            builder
                .send()
                .await
                .map_err(|e| Box::new(e.without_url()) as BoxError)
        })
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn round_trip<'a>(
        &'a self,
        req: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<reqwest::Response, BoxError>> {
        (**self).round_trip(req)
    }
}

pub fn build_http_client(cfg: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
}

/// Authenticates every request with a static DocBase access token.
pub struct TokenTransport {
    token: String,
    inner: Option<Arc<dyn Transport>>,
    fallback: OnceLock<reqwest::Client>,
}

impl TokenTransport {
    /// Sends through a default `reqwest::Client` unless [`with_inner`](Self::with_inner) is used.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            inner: None,
            fallback: OnceLock::new(),
        }
    }

    pub fn with_inner(mut self, inner: impl Transport + 'static) -> Self {
        self.inner = Some(Arc::new(inner));
        self
    }

    fn transport(&self) -> &dyn Transport {
        match &self.inner {
            Some(inner) => inner.as_ref(),
            None => self.fallback.get_or_init(reqwest::Client::new),
        }
    }
}

impl std::fmt::Debug for TokenTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTransport")
            .field("token", &"<redacted>")
            .field("inner", &self.inner.is_some())
            .finish()
    }
}

impl Transport for TokenTransport {
    fn round_trip<'a>(
        &'a self,
        req: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<reqwest::Response, BoxError>> {
        Box::pin(async move {
            let mut token = HeaderValue::from_str(&self.token)?;
            token.set_sensitive(true);
            let authed = req.with_header(HeaderName::from_static(HEADER_TOKEN), token);
            self.transport().round_trip(&authed).await
        })
    }
}
