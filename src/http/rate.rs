use crate::http::error::RateLimitError;
use crate::http::request::ApiRequest;
use crate::http::Response;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};

pub const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_RESET: &str = "x-ratelimit-reset";

/// Rate limit snapshot as reported by the most recent API response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rate {
    /// Requests allowed per window.
    pub limit: i64,
    /// Requests left in the current window.
    pub remaining: i64,
    /// When the window resets. `None` until a reset time has been observed.
    pub reset: Option<DateTime<Utc>>,
}

impl Rate {
    /// True when the quota is used up and the reset time is still ahead of `now`.
    pub fn is_exhausted_at(&self, now: DateTime<Utc>) -> bool {
        match self.reset {
            Some(reset) => self.remaining == 0 && now < reset,
            None => false,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reset = self
            .reset
            .map(|r| r.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{{limit:{},remaining:{},reset:{}}}",
            self.limit, self.remaining, reset
        )
    }
}

pub fn parse_rate(headers: &HeaderMap) -> Rate {
    fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
    }
    let reset = header_i64(headers, HEADER_RATE_RESET)
        .filter(|epoch| *epoch != 0)
        .and_then(|epoch| DateTime::<Utc>::from_timestamp(epoch, 0));
    Rate {
        limit: header_i64(headers, HEADER_RATE_LIMIT).unwrap_or(0),
        remaining: header_i64(headers, HEADER_RATE_REMAINING).unwrap_or(0),
        reset,
    }
}

/// Renders the distance to a reset time, e.g. `[rate reset in 2m05s]` or
/// `[rate limit was reset 7s ago]` when `d` is negative.
pub fn format_rate_reset(d: chrono::Duration) -> String {
    let negative = d < chrono::Duration::zero();
    let abs = if negative { -d } else { d };
    let total = (abs.num_milliseconds() + 500) / 1000;
    let minutes = total / 60;
    let seconds = total % 60;
    let span = if minutes > 0 {
        format!("{}m{:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };
    if negative {
        format!("[rate limit was reset {} ago]", span)
    } else {
        format!("[rate reset in {}]", span)
    }
}

/// Last known quota, shared by every call made through one client.
#[derive(Debug, Default)]
pub struct RateState {
    current: Mutex<Rate>,
}

impl RateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Rate {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self, rate: Rate) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = rate;
    }

    /// Parses the rate headers of a response and records them as the current quota.
    pub fn observe(&self, headers: &HeaderMap) -> Rate {
        let rate = parse_rate(headers);
        self.store(rate);
        rate
    }

    /// Fails fast, without touching the network, while the stored quota is
    /// exhausted and its reset time has not yet passed.
    pub fn check_before_send(&self, req: &ApiRequest) -> Option<RateLimitError> {
        let rate = self.snapshot();
        let reset = rate.reset?;
        if !rate.is_exhausted_at(Utc::now()) {
            return None;
        }
        let response = Response {
            method: req.method().clone(),
            url: req.url().clone(),
            status: StatusCode::FORBIDDEN,
            headers: HeaderMap::new(),
            rate,
            meta: None,
        };
        let message = format!(
            "API rate limit of {} still exceeded until {}, not making remote request.",
            rate.limit,
            reset.to_rfc3339()
        );
        Some(RateLimitError::new(response, rate, vec![message]))
    }
}
