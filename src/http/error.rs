use crate::http::rate::{format_rate_reset, Rate};
use crate::http::Response;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::fmt;
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const REDACTED: &str = "REDACTED";

/// Replaces a non-empty `client_secret` query value so the URL is safe to print.
pub fn sanitize_url(url: &Url) -> Url {
    let has_secret = url
        .query_pairs()
        .any(|(k, v)| k == "client_secret" && !v.is_empty());
    if !has_secret {
        return url.clone();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == "client_secret" {
                (k.into_owned(), REDACTED.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    let mut out = url.clone();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("{method} {}: {source}", sanitize_url(.url))]
    Transport {
        method: Method,
        url: Url,
        #[source]
        source: BoxError,
    },
    #[error("request cancelled")]
    Cancelled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{} {}: failed to decode response body: {source}", .response.method, sanitize_url(&.response.url))]
    Decode {
        response: Box<Response>,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} {}: failed to write response body: {source}", .response.method, sanitize_url(&.response.url))]
    Sink {
        response: Box<Response>,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Network, I/O, cancellation and request construction failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest(_)
                | Error::Encode(_)
                | Error::HttpClient(_)
                | Error::Transport { .. }
                | Error::Cancelled
                | Error::DeadlineExceeded
        )
    }

    /// The envelope received before the failure, if the call got that far.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::RateLimit(e) => Some(e.response()),
            Error::Api(e) => Some(e.response()),
            Error::Decode { response, .. } | Error::Sink { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// The service refused the call because the quota is used up.
#[derive(Debug, Clone)]
pub struct RateLimitError {
    response: Box<Response>,
    rate: Rate,
    messages: Vec<String>,
}

impl RateLimitError {
    pub fn new(response: Response, rate: Rate, messages: Vec<String>) -> Self {
        Self {
            response: Box::new(response),
            rate,
            messages,
        }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Last known quota; `reset` tells when a retry can succeed.
    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reset = match self.rate.reset {
            Some(reset) => format_rate_reset(reset - Utc::now()),
            None => "[rate reset unknown]".to_string(),
        };
        write!(
            f,
            "{} {}: {} {:?} {}",
            self.response.method,
            sanitize_url(&self.response.url),
            self.response.status.as_u16(),
            self.messages,
            reset
        )
    }
}

impl std::error::Error for RateLimitError {}

/// Any non-2xx answer other than 429.
#[derive(Debug, Clone)]
pub struct ApiError {
    response: Box<Response>,
    value: String,
    messages: Vec<String>,
}

impl ApiError {
    pub fn new(response: Response, value: String, messages: Vec<String>) -> Self {
        Self {
            response: Box::new(response),
            value,
            messages,
        }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Top level `error` string of the payload, empty when absent.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {} {:?}",
            self.response.method,
            sanitize_url(&self.response.url),
            self.response.status.as_u16(),
            self.value,
            self.messages
        )
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    messages: Vec<String>,
}

/// Turns a completed non-2xx response into an error. The body is the raw
/// payload; `response.rate` is the snapshot recorded for this response.
pub fn classify(response: Response, body: &[u8]) -> Error {
    let detail = if body.iter().all(u8::is_ascii_whitespace) {
        ErrorBody::default()
    } else {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(d) => d,
            Err(source) => {
                return Error::Decode {
                    response: Box::new(response),
                    source,
                }
            }
        }
    };
    if response.status == StatusCode::TOO_MANY_REQUESTS {
        let rate = response.rate;
        return Error::RateLimit(RateLimitError::new(response, rate, detail.messages));
    }
    Error::Api(ApiError::new(response, detail.error, detail.messages))
}
