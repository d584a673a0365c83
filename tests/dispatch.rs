//! Dispatcher behaviour against in-process fake transports.

use docbase::http::error::BoxError;
use docbase::{ApiRequest, Client, Context, Error, Target, Transport};
use futures::future::BoxFuture;
use reqwest::{Method, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Reply = Result<http::Response<Vec<u8>>, BoxError>;

/// Answers every request with `handler(request, call_index)` and counts calls.
struct Fake<F> {
    calls: AtomicUsize,
    delay: Option<Duration>,
    handler: F,
}

impl<F> Fake<F>
where
    F: Fn(&ApiRequest, usize) -> Reply + Send + Sync,
{
    fn new(handler: F) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: None,
            handler,
        })
    }

    fn delayed(delay: Duration, handler: F) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
            handler,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> Transport for Fake<F>
where
    F: Fn(&ApiRequest, usize) -> Reply + Send + Sync,
{
    fn round_trip<'a>(
        &'a self,
        req: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<reqwest::Response, BoxError>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            (self.handler)(req, n).map(reqwest::Response::from)
        })
    }
}

fn json(status: u16, body: &str) -> Reply {
    Ok(http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(body.as_bytes().to_vec())?)
}

fn client(transport: impl Transport + 'static) -> Client {
    Client::builder("kyoh86")
        .api_url("https://api.docbase.io")
        .transport(transport)
        .build()
        .unwrap()
}

fn epoch_in(secs: i64) -> String {
    (chrono::Utc::now().timestamp() + secs).to_string()
}

#[tokio::test]
async fn exhausted_quota_short_circuits_without_network() {
    let reset = epoch_in(600);
    let fake = Fake::new(move |_, _| {
        Ok(http::Response::builder()
            .status(200)
            .header("X-RateLimit-Limit", "300")
            .header("X-RateLimit-Remaining", "0")
            .header("X-RateLimit-Reset", reset.as_str())
            .body(b"[]".to_vec())?)
    });
    let client = client(fake.clone());
    let ctx = Context::background();

    let (_, resp) = client.tags().list().send(&ctx).await.unwrap();
    assert_eq!(resp.rate.remaining, 0);
    assert_eq!(fake.calls(), 1);

    for _ in 0..3 {
        let err = client.tags().list().send(&ctx).await.unwrap_err();
        let Error::RateLimit(rl) = &err else {
            panic!("expected rate limit error, got {err:?}");
        };
        assert_eq!(rl.rate().limit, 300);
        assert_eq!(rl.response().status, StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("[rate reset in"));
    }
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn elapsed_reset_lets_request_through() {
    let reset = epoch_in(-5);
    let fake = Fake::new(move |_, _| {
        Ok(http::Response::builder()
            .status(200)
            .header("X-RateLimit-Limit", "300")
            .header("X-RateLimit-Remaining", "0")
            .header("X-RateLimit-Reset", reset.as_str())
            .body(b"[]".to_vec())?)
    });
    let client = client(fake.clone());
    let ctx = Context::background();

    client.tags().list().send(&ctx).await.unwrap();
    client.tags().list().send(&ctx).await.unwrap();
    assert_eq!(fake.calls(), 2);
}

#[tokio::test]
async fn echoed_body_round_trips_unescaped() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let fake = Fake::new(move |req: &ApiRequest, _| {
        let body = req.body().map(|b| b.to_vec()).unwrap_or_default();
        sink.lock().unwrap().extend_from_slice(&body);
        Ok(http::Response::builder().status(200).body(body)?)
    });
    let client = client(fake);

    let sent = serde_json::json!({"a": 1, "html": "<b>"});
    let req = client
        .new_json_request(Method::POST, "teams/kyoh86/echo", &sent)
        .unwrap();
    let mut got = serde_json::Value::Null;
    client
        .dispatch(&req, &Context::background(), Target::Json(&mut got))
        .await
        .unwrap();

    assert_eq!(got, sent);
    let raw = String::from_utf8(seen.lock().unwrap().clone()).unwrap();
    assert!(raw.contains("<b>"));
    assert!(!raw.contains("\\u003c"));
}

#[tokio::test]
async fn too_many_requests_is_rate_limit_error() {
    let fake = Fake::new(|_, _| {
        json(
            429,
            r#"{"error":"too_many_requests","messages":["slow down"]}"#,
        )
    });
    let client = client(fake);
    let err = client
        .posts()
        .list()
        .send(&Context::background())
        .await
        .unwrap_err();
    let Error::RateLimit(rl) = &err else {
        panic!("expected rate limit error, got {err:?}");
    };
    assert_eq!(rl.messages(), ["slow down".to_string()]);
    assert_eq!(rl.response().status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn not_found_is_api_error() {
    let fake = Fake::new(|_, _| json(404, r#"{"error":"not_found","messages":["missing"]}"#));
    let client = client(fake);
    let err = client
        .posts()
        .get(docbase::types::PostId(1))
        .send(&Context::background())
        .await
        .unwrap_err();
    let Error::Api(api) = &err else {
        panic!("expected api error, got {err:?}");
    };
    assert_eq!(api.status(), StatusCode::NOT_FOUND);
    assert_eq!(api.value(), "not_found");
    assert_eq!(api.messages(), ["missing".to_string()]);
    assert!(!err.is_transport());
}

#[tokio::test]
async fn empty_success_body_leaves_target_alone() {
    let fake = Fake::new(|_, _| Ok(http::Response::builder().status(200).body(Vec::new())?));
    let client = client(fake);
    let req = client.new_request(Method::GET, "teams/kyoh86/tags").unwrap();
    let mut tags = vec!["untouched".to_string()];
    let resp = client
        .dispatch(&req, &Context::background(), Target::Json(&mut tags))
        .await
        .unwrap();
    assert_eq!(tags, vec!["untouched".to_string()]);
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.meta.is_none());
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let fake = Fake::new(|_, _| json(200, r#"{"id": "#));
    let client = client(fake);
    let err = client
        .groups()
        .get(docbase::types::GroupId(3))
        .send(&Context::background())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(err.response().unwrap().status, StatusCode::OK);
}

#[tokio::test]
async fn transport_errors_redact_client_secret() {
    let fake = Fake::new(|_, _| Err("connection refused".into()));
    let client = client(fake);
    let req = client
        .new_request(Method::GET, "oauth/token?client_id=app&client_secret=topsecret")
        .unwrap();
    let err = client
        .dispatch(&req, &Context::background(), Target::Discard)
        .await
        .unwrap_err();
    assert!(err.is_transport());
    let rendered = err.to_string();
    assert!(rendered.contains("client_secret=REDACTED"), "{rendered}");
    assert!(!rendered.contains("topsecret"));
}

#[tokio::test]
async fn raw_bytes_go_to_sink_verbatim() {
    let payload: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
    let body = payload.clone();
    let fake = Fake::new(move |_, _| Ok(http::Response::builder().status(200).body(body.clone())?));
    let client = client(fake);
    let mut out: Vec<u8> = Vec::new();
    client
        .attachments()
        .download(docbase::types::AttachmentId(9))
        .send(&Context::background(), &mut out)
        .await
        .unwrap();
    assert_eq!(out, payload);
}

#[tokio::test]
async fn list_meta_is_hoisted() {
    let fake = Fake::new(|req: &ApiRequest, _| {
        assert_eq!(req.url().path(), "/teams/kyoh86/posts");
        assert_eq!(req.url().query(), Some("page=2&per_page=1&q=tag%3Arust"));
        json(
            200,
            r#"{"posts":[{"id":1,"title":"t","body":"b"}],
                "meta":{"next_page":"https://api.docbase.io/teams/kyoh86/posts?page=3&per_page=1","previous_page":null,"total":3}}"#,
        )
    });
    let client = client(fake);
    let (posts, resp) = client
        .posts()
        .list()
        .query("tag:rust")
        .page(2)
        .per_page(1)
        .send(&Context::background())
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    let meta = resp.meta.unwrap();
    assert_eq!(meta.total, 3);
    assert_eq!(meta.next().unwrap().page, Some(3));
    assert!(meta.previous().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_responses_leave_one_whole_rate() {
    const N: usize = 64;
    let fake = Fake::new(|_, n| {
        Ok(http::Response::builder()
            .status(200)
            .header("X-RateLimit-Limit", (1000 + n).to_string())
            .header("X-RateLimit-Remaining", (1000 - n).to_string())
            .header("X-RateLimit-Reset", (2_000_000_000 + n as i64).to_string())
            .body(Vec::new())?)
    });
    let client = Arc::new(client(fake.clone()));

    let mut tasks = Vec::new();
    for _ in 0..N {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let req = client.new_request(Method::GET, "teams/kyoh86/tags").unwrap();
            client
                .dispatch(&req, &Context::background(), Target::Discard)
                .await
                .map(|r| r.rate)
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(fake.calls(), N);
    let rate = client.rate();
    let n = (rate.limit - 1000) as usize;
    assert!(n < N);
    assert_eq!(rate.remaining, (1000 - n) as i64);
    assert_eq!(rate.reset.unwrap().timestamp(), 2_000_000_000 + n as i64);
}

#[tokio::test]
async fn cancellation_beats_connection_reset() {
    // The transport cancels the caller's context, then fails the send.
    let (ctx, handle) = Context::background().with_cancel();
    let handle = Mutex::new(Some(handle));
    let fake = Fake::new(move |_, _| {
        if let Some(h) = handle.lock().unwrap().take() {
            h.cancel();
        }
        Err("connection reset by peer".into())
    });
    let client = client(fake);
    let req = client.new_request(Method::GET, "teams/kyoh86/tags").unwrap();
    let err = client.dispatch(&req, &ctx, Target::Discard).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled), "{err:?}");
}

#[tokio::test]
async fn cancel_mid_flight_returns_promptly() {
    let fake = Fake::delayed(Duration::from_secs(30), |_, _| json(200, "[]"));
    let client = client(fake.clone());
    let (ctx, handle) = Context::background().with_cancel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });
    let started = std::time::Instant::now();
    let err = client.tags().list().send(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn deadline_is_reported() {
    let fake = Fake::delayed(Duration::from_secs(30), |_, _| json(200, "[]"));
    let client = client(fake);
    let ctx = Context::background().with_timeout(Duration::from_millis(20));
    let err = client.tags().list().send(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded), "{err:?}");
}

#[tokio::test]
async fn already_cancelled_context_sends_nothing() {
    let fake = Fake::new(|_, _| json(200, "[]"));
    let client = client(fake.clone());
    let (ctx, handle) = Context::background().with_cancel();
    handle.cancel();
    let err = client.tags().list().send(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(fake.calls(), 0);
}

/// Answers with a streamed body built fresh for every call.
struct Streaming<F>(F);

impl<F> Transport for Streaming<F>
where
    F: Fn() -> reqwest::Response + Send + Sync,
{
    fn round_trip<'a>(
        &'a self,
        _req: &'a ApiRequest,
    ) -> BoxFuture<'a, Result<reqwest::Response, BoxError>> {
        Box::pin(async move { Ok::<_, BoxError>((self.0)()) })
    }
}

fn streamed<S>(status: u16, chunks: S) -> reqwest::Response
where
    S: futures::Stream<Item = std::io::Result<bytes::Bytes>> + Send + 'static,
{
    let res = http::Response::builder()
        .status(status)
        .body(reqwest::Body::wrap_stream(chunks))
        .unwrap();
    reqwest::Response::from(res)
}

#[tokio::test]
async fn null_success_body_leaves_target_alone() {
    let fake = Fake::new(|_, _| json(200, " null\n"));
    let client = client(fake);
    let req = client.new_request(Method::GET, "teams/kyoh86/tags").unwrap();
    let mut tags = vec!["untouched".to_string()];
    client
        .dispatch(&req, &Context::background(), Target::Json(&mut tags))
        .await
        .unwrap();
    assert_eq!(tags, vec!["untouched".to_string()]);
}

#[tokio::test]
async fn unreadable_error_body_still_reports_status() {
    let client = client(Streaming(|| {
        streamed(
            500,
            futures::stream::iter(vec![
                Ok(bytes::Bytes::from_static(b"{\"err")),
                Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )),
            ]),
        )
    }));
    let err = client
        .tags()
        .list()
        .send(&Context::background())
        .await
        .unwrap_err();
    let Error::Api(api) = &err else {
        panic!("expected api error, got {err:?}");
    };
    assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(api.value(), "");
    assert!(api.messages().is_empty());
}

#[tokio::test]
async fn sink_collects_every_chunk_under_a_deadline() {
    let client = client(Streaming(|| {
        let chunks: Vec<std::io::Result<bytes::Bytes>> = (0u8..50)
            .map(|i| Ok(bytes::Bytes::from(vec![i; 64])))
            .collect();
        streamed(200, futures::stream::iter(chunks))
    }));
    let ctx = Context::background().with_timeout(Duration::from_secs(30));
    let mut out: Vec<u8> = Vec::new();
    client
        .attachments()
        .download(docbase::types::AttachmentId(1))
        .send(&ctx, &mut out)
        .await
        .unwrap();
    assert_eq!(out.len(), 50 * 64);
    assert_eq!(out[64 * 49], 49);
}

#[tokio::test]
async fn stalled_download_hits_deadline() {
    use futures::StreamExt;

    let client = client(Streaming(|| {
        let first = futures::stream::iter(vec![Ok(bytes::Bytes::from_static(b"head"))]);
        streamed(200, first.chain(futures::stream::pending()))
    }));
    let ctx = Context::background().with_timeout(Duration::from_millis(50));
    let mut out: Vec<u8> = Vec::new();
    let err = client
        .attachments()
        .download(docbase::types::AttachmentId(1))
        .send(&ctx, &mut out)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded), "{err:?}");
    assert_eq!(out, b"head");
}
