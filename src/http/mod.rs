pub mod context;
pub mod error;
pub mod rate;
pub mod request;
pub mod transport;

use crate::http::rate::Rate;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use url::Url;

/// What one call produced besides its decoded body.
#[derive(Debug, Clone)]
pub struct Response {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Quota reported by this response.
    pub rate: Rate,
    /// Pagination block of list endpoints.
    pub meta: Option<Meta>,
}

/// Page links of a list response. Any field may be empty for the last page
/// or for responses that are not paginated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meta {
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub previous_page: Option<String>,
    #[serde(default)]
    pub total: i64,
}

/// Optional pagination parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListOptions {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Meta {
    pub fn next(&self) -> Option<ListOptions> {
        page_options(self.next_page.as_deref()?)
    }

    pub fn previous(&self) -> Option<ListOptions> {
        page_options(self.previous_page.as_deref()?)
    }
}

fn page_options(link: &str) -> Option<ListOptions> {
    let url = Url::parse(link).ok()?;
    let find = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.parse::<i64>().ok())
    };
    Some(ListOptions {
        page: Some(find("page")?),
        per_page: Some(find("per_page")?),
    })
}

#[derive(Deserialize)]
struct MetaProbe {
    meta: Option<Meta>,
}

/// Pulls a top-level `meta` object out of a JSON body, if there is one.
pub(crate) fn hoist_meta(body: &[u8]) -> Option<Meta> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }
    serde_json::from_slice::<MetaProbe>(body).ok()?.meta
}

/// A typed value a JSON body can be decoded into.
pub trait JsonSlot: Send {
    fn fill(&mut self, body: &[u8]) -> serde_json::Result<()>;
}

impl<T: DeserializeOwned + Send> JsonSlot for T {
    fn fill(&mut self, body: &[u8]) -> serde_json::Result<()> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }
}

/// Where a successful response body goes.
pub enum Target<'a> {
    /// Drop the body unread.
    Discard,
    /// Decode JSON into the slot; an empty or `null` body leaves it untouched.
    Json(&'a mut dyn JsonSlot),
    /// Copy the raw bytes into the writer as they arrive.
    Sink(&'a mut (dyn AsyncWrite + Unpin + Send)),
}
