use crate::config::{default_user_agent, Config, DEFAULT_API_URL, DEFAULT_API_VERSION};
use crate::http::context::Context;
use crate::http::error::{classify, sanitize_url, Error};
use crate::http::rate::{Rate, RateState};
use crate::http::request::{ApiRequest, RequestBuilder};
use crate::http::transport::{build_http_client, TokenTransport, Transport};
use crate::http::{hoist_meta, Response, Target};
use crate::services::{Attachments, Comments, Groups, Posts, Tags, Teams, Users};
use bytes::Bytes;
use log::{debug, warn};
use reqwest::Method;
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// A client for one DocBase team.
pub struct Client {
    transport: Arc<dyn Transport>,
    requests: RequestBuilder,
    domain: String,
    rate: RateState,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.requests.base_url().as_str())
            .field("domain", &self.domain)
            .field("rate", &self.rate.snapshot())
            .finish()
    }
}

pub struct ClientBuilder {
    domain: String,
    api_url: String,
    api_version: String,
    user_agent: String,
    token: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Wraps the transport in a [`TokenTransport`] at build time.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Result<Client, Error> {
        let requests = RequestBuilder::new(&self.api_url, &self.api_version, &self.user_agent)?;
        let transport: Arc<dyn Transport> = match (self.token, self.transport) {
            (Some(token), Some(inner)) => Arc::new(TokenTransport::new(token).with_inner(inner)),
            (Some(token), None) => Arc::new(TokenTransport::new(token)),
            (None, Some(inner)) => inner,
            (None, None) => Arc::new(reqwest::Client::new()),
        };
        Ok(Client {
            transport,
            requests,
            domain: self.domain,
            rate: RateState::new(),
        })
    }
}

impl Client {
    pub fn builder(domain: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            domain: domain.into(),
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            token: None,
            transport: None,
        }
    }

    /// Authenticated client over a rustls `reqwest` transport.
    pub fn from_config(cfg: &Config) -> Result<Client, Error> {
        let http = build_http_client(cfg).map_err(Error::HttpClient)?;
        Client::builder(cfg.domain.clone())
            .api_url(cfg.api_url.clone())
            .api_version(cfg.api_version.clone())
            .user_agent(cfg.user_agent.clone())
            .token(cfg.token.clone())
            .transport(http)
            .build()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Quota reported by the most recent response.
    pub fn rate(&self) -> Rate {
        self.rate.snapshot()
    }

    /// `teams/<domain>/<rest>`, relative to the API origin.
    pub fn team_path(&self, rest: &str) -> String {
        format!("teams/{}/{}", urlencoding::encode(&self.domain), rest)
    }

    pub fn new_request(&self, method: Method, path: &str) -> Result<ApiRequest, Error> {
        self.requests.request(method, path)
    }

    pub fn new_json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiRequest, Error> {
        self.requests.json_request(method, path, body)
    }

    pub fn new_upload_request<R: Read>(
        &self,
        path: &str,
        reader: R,
        size: u64,
        media_type: Option<&str>,
    ) -> Result<ApiRequest, Error> {
        self.requests.upload_request(path, reader, size, media_type)
    }

    /// Sends `req` and writes a successful body into `target`.
    ///
    /// Returns a [`Error::RateLimit`] without any network call while the last
    /// known quota is exhausted and not yet reset. Cancellation of `ctx`
    /// takes precedence over a transport failure seen at the same time.
    pub async fn dispatch(
        &self,
        req: &ApiRequest,
        ctx: &Context,
        target: Target<'_>,
    ) -> Result<Response, Error> {
        debug!("{} {}", req.method(), sanitize_url(req.url()));
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        if let Some(err) = self.rate.check_before_send(req) {
            warn!(
                "{} {}: rate limit exhausted, skipping request",
                req.method(),
                sanitize_url(req.url())
            );
            return Err(Error::RateLimit(err));
        }

        let sent = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            res = self.transport.round_trip(req) => res,
        };
        let mut res = match sent {
            Ok(r) => r,
            Err(source) => {
                if let Some(err) = ctx.err() {
                    return Err(err);
                }
                warn!(
                    "{} {}: error sending request: {}",
                    req.method(),
                    sanitize_url(req.url()),
                    source
                );
                return Err(transport_error(req, source));
            }
        };

        let status = res.status();
        let headers = res.headers().clone();
        let rate = self.rate.observe(&headers);
        let mut response = Response {
            method: req.method().clone(),
            url: req.url().clone(),
            status,
            headers,
            rate,
            meta: None,
        };

        if !status.is_success() {
            let body = match read_body(res, req, ctx).await {
                Ok(b) => b,
                Err(err @ (Error::Cancelled | Error::DeadlineExceeded)) => return Err(err),
                Err(err) => {
                    warn!(
                        "{} {}: error reading body of {} response: {}",
                        req.method(),
                        sanitize_url(req.url()),
                        status.as_u16(),
                        err
                    );
                    Bytes::new()
                }
            };
            return Err(classify(response, &body));
        }

        match target {
            Target::Discard => {}
            Target::Sink(sink) => {
                let done = ctx.done();
                tokio::pin!(done);
                loop {
                    let chunk = tokio::select! {
                        biased;
                        err = &mut done => return Err(err),
                        c = res.chunk() => c.map_err(|e| transport_error(req, Box::new(e.without_url())))?,
                    };
                    let Some(chunk) = chunk else {
                        if let Err(source) = sink.flush().await {
                            return Err(Error::Sink {
                                response: Box::new(response),
                                source,
                            });
                        }
                        break;
                    };
                    if let Err(source) = sink.write_all(&chunk).await {
                        return Err(Error::Sink {
                            response: Box::new(response),
                            source,
                        });
                    }
                }
            }
            Target::Json(slot) => {
                let body = read_body(res, req, ctx).await?;
                if !is_blank_json(&body) {
                    response.meta = hoist_meta(&body);
                    if let Err(source) = slot.fill(&body) {
                        return Err(Error::Decode {
                            response: Box::new(response),
                            source,
                        });
                    }
                }
            }
        }
        Ok(response)
    }

    pub fn teams(&self) -> Teams<'_> {
        Teams::new(self)
    }

    pub fn posts(&self) -> Posts<'_> {
        Posts::new(self)
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments::new(self)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    pub fn tags(&self) -> Tags<'_> {
        Tags::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn attachments(&self) -> Attachments<'_> {
        Attachments::new(self)
    }
}

fn transport_error(req: &ApiRequest, source: crate::http::error::BoxError) -> Error {
    Error::Transport {
        method: req.method().clone(),
        url: req.url().clone(),
        source,
    }
}

/// Empty, whitespace-only and `null` bodies carry nothing to decode.
fn is_blank_json(body: &[u8]) -> bool {
    let trimmed = body.trim_ascii();
    trimmed.is_empty() || trimmed == b"null"
}

async fn read_body(res: reqwest::Response, req: &ApiRequest, ctx: &Context) -> Result<Bytes, Error> {
    tokio::select! {
        biased;
        err = ctx.done() => Err(err),
        body = res.bytes() => body.map_err(|e| transport_error(req, Box::new(e.without_url()))),
    }
}
