use crate::auth::AuthToken;
use crate::config::{ArgoCdConfig, Scheme};
use crate::errors::TransportFailure;
use crate::transport::{RawResponse, Transport};
use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{AUTHORIZATION, HeaderValue, LOCATION};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Config pointing at a plain-HTTP server on localhost with short backoff
pub fn argocd_config(port: u16) -> ArgoCdConfig {
    ArgoCdConfig {
        server: "127.0.0.1".into(),
        port,
        scheme: Scheme::Http,
        timeout_secs: 2,
        max_attempts: 3,
        backoff_base_ms: 10,
        backoff_max_ms: 100,
        insecure_skip_tls_verify: false,
    }
}

/// What the mock transport does on one call
#[derive(Clone, Debug)]
pub enum MockStep {
    Respond(RawResponse),
    Fail(TransportFailure),
    /// Never completes; only the caller's timeout ends the attempt
    Hang,
}

impl MockStep {
    pub fn respond(status: u16, body: &str) -> Self {
        MockStep::Respond(RawResponse {
            status,
            body: Bytes::from(body.to_string()),
        })
    }

    pub fn fail(failure: TransportFailure) -> Self {
        MockStep::Fail(failure)
    }
}

/// Scripted transport. Call `n` plays step `n`; the last step repeats forever.
pub struct MockTransport {
    steps: Vec<MockStep>,
    calls: AtomicUsize,
    last_url: Mutex<Option<Url>>,
}

impl MockTransport {
    pub fn new(steps: Vec<MockStep>) -> Self {
        assert!(!steps.is_empty(), "mock transport needs at least one step");
        MockTransport {
            steps,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<Url> {
        self.last_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url, _token: &AuthToken) -> Result<RawResponse, TransportFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.clone());

        let step = self.steps[call.min(self.steps.len() - 1)].clone();
        match step {
            MockStep::Respond(response) => Ok(response),
            MockStep::Fail(failure) => Err(failure),
            MockStep::Hang => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct MockState {
    hits: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
    last_path: Mutex<Option<String>>,
}

/// Local HTTP server standing in for the ArgoCD API. Answers every request
/// with the same status and body, plus a `Location` header when redirecting.
pub struct MockArgoCd {
    port: u16,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockArgoCd {
    pub async fn start(status: u16, body: &'static str) -> Self {
        Self::serve(status, body, None).await
    }

    /// Answers every request with `302 Found` pointing at `location`
    pub async fn redirect(location: &'static str) -> Self {
        Self::serve(302, "", Some(location)).await
    }

    async fn serve(status: u16, body: &'static str, location: Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(MockState::default());
        let status = StatusCode::from_u16(status).unwrap();

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let io = TokioIo::new(stream);
                let state = server_state.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = state.clone();
                        async move {
                            state.hits.fetch_add(1, Ordering::SeqCst);
                            *state.last_authorization.lock().unwrap() = req
                                .headers()
                                .get(AUTHORIZATION)
                                .and_then(|v| v.to_str().ok())
                                .map(String::from);
                            *state.last_path.lock().unwrap() = Some(req.uri().path().to_string());

                            let mut response = Response::new(Full::new(Bytes::from_static(
                                body.as_bytes(),
                            )));
                            *response.status_mut() = status;
                            if let Some(location) = location {
                                response
                                    .headers_mut()
                                    .insert(LOCATION, HeaderValue::from_static(location));
                            }
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        MockArgoCd {
            port,
            state,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }

    pub fn last_path(&self) -> Option<String> {
        self.state.last_path.lock().unwrap().clone()
    }
}

impl Drop for MockArgoCd {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
