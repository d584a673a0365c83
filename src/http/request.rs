use crate::http::error::Error;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use url::Url;

pub const HEADER_API_VERSION: &str = "x-api-version";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// A fully formed outbound request. Built once, then only read.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url, headers: HeaderMap, body: Option<Bytes>) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Same request with one header replaced. The body is shared, the header
    /// map is copied, `self` is left as it was.
    pub fn with_header(&self, name: HeaderName, value: HeaderValue) -> Self {
        let mut copy = self.clone();
        copy.headers.insert(name, value);
        copy
    }
}

/// Resolves relative API paths and stamps the standard headers.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Url,
    api_version: HeaderValue,
    user_agent: HeaderValue,
}

impl RequestBuilder {
    pub fn new(base_url: &str, api_version: &str, user_agent: &str) -> Result<Self, Error> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .map_err(|e| Error::InvalidRequest(format!("bad base url {:?}: {}", base_url, e)))?;
        Ok(Self {
            base_url,
            api_version: header_value(api_version)?,
            user_agent: header_value(user_agent)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn resolve(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with('/') {
            return Err(Error::InvalidRequest(format!(
                "path must be relative, got {:?}",
                path
            )));
        }
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidRequest(format!("bad path {:?}: {}", path, e)))
    }

    fn standard_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(HEADER_API_VERSION, self.api_version.clone());
        headers
    }

    pub fn request(&self, method: Method, path: &str) -> Result<ApiRequest, Error> {
        let url = self.resolve(path)?;
        Ok(ApiRequest::new(method, url, self.standard_headers(), None))
    }

    /// serde_json never HTML-escapes, so markup in bodies goes out verbatim.
    pub fn json_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiRequest, Error> {
        let url = self.resolve(path)?;
        let encoded = serde_json::to_vec(body).map_err(Error::Encode)?;
        let mut headers = self.standard_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        Ok(ApiRequest::new(method, url, headers, Some(Bytes::from(encoded))))
    }

    pub fn upload_request<R: Read>(
        &self,
        path: &str,
        reader: R,
        size: u64,
        media_type: Option<&str>,
    ) -> Result<ApiRequest, Error> {
        let url = self.resolve(path)?;
        let mut buf = Vec::new();
        reader
            .take(size)
            .read_to_end(&mut buf)
            .map_err(|e| Error::InvalidRequest(format!("reading upload body: {}", e)))?;
        if buf.len() as u64 != size {
            return Err(Error::InvalidRequest(format!(
                "upload body is {} bytes, expected {}",
                buf.len(),
                size
            )));
        }
        let media_type = media_type
            .filter(|m| !m.is_empty())
            .unwrap_or(CONTENT_TYPE_OCTET_STREAM);
        let mut headers = self.standard_headers();
        headers.insert(CONTENT_TYPE, header_value(media_type)?);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
        Ok(ApiRequest::new(Method::POST, url, headers, Some(Bytes::from(buf))))
    }
}

fn header_value(s: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(s).map_err(|e| Error::InvalidRequest(format!("bad header value {:?}: {}", s, e)))
}

/// Appends the fields of `opts` to `path` as query parameters. Unset
/// (`null`) fields are left out, arrays repeat their key, keys are sorted and
/// any query already on `path` is replaced. `None` returns `path` untouched.
pub fn add_options<O: Serialize>(path: &str, opts: Option<&O>) -> Result<String, Error> {
    let Some(opts) = opts else {
        return Ok(path.to_string());
    };
    let value = serde_json::to_value(opts).map_err(Error::Encode)?;
    let Value::Object(fields) = value else {
        return Err(Error::InvalidRequest(
            "query options must serialize to an object".to_string(),
        ));
    };
    let base = path.split_once('?').map_or(path, |(p, _)| p);
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for key in keys {
        let field = &fields[key];
        match field {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = query_scalar(item) {
                        query.append_pair(key, &s);
                    }
                }
            }
            other => {
                if let Some(s) = query_scalar(other) {
                    query.append_pair(key, &s);
                }
            }
        }
    }
    let query = query.finish();
    if query.is_empty() {
        Ok(base.to_string())
    } else {
        Ok(format!("{}?{}", base, query))
    }
}

fn query_scalar(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
