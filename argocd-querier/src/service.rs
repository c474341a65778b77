use crate::QuerierError;
use crate::auth::bearer_token;
use crate::config::CorsConfig;
use crate::errors::GatewayError;
use crate::metrics_defs::REQUESTS_INFLIGHT;
use crate::models::HealthCheckResponse;
use crate::pipeline::ArgoCdQuerier;
use crate::transform::Transformed;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ALLOW, HeaderMap, HeaderValue, ORIGIN, VARY,
};
use http::{Method, StatusCode};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use serde::Serialize;
use shared::gauge;
use shared::http::{full_body, make_boxed_error_response, make_json_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerBody = BoxBody<Bytes, QuerierError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    ApplicationStatus,
    ListProjects,
    Health,
}

impl Route {
    fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "/argocd/application_status" => Some(Route::ApplicationStatus),
            "/argocd/list_projects" => Some(Route::ListProjects),
            "/health" => Some(Route::Health),
            _ => None,
        }
    }
}

/// Serves the `/argocd/*` endpoints on the main listener.
pub struct QuerierService {
    querier: Arc<ArgoCdQuerier>,
    cors: Arc<CorsConfig>,
}

impl QuerierService {
    pub fn new(querier: ArgoCdQuerier, cors: CorsConfig) -> Self {
        Self {
            querier: Arc::new(querier),
            cors: Arc::new(cors),
        }
    }
}

impl Service<Request<Incoming>> for QuerierService {
    type Response = Response<HandlerBody>;
    type Error = QuerierError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let querier = self.querier.clone();
        let cors = self.cors.clone();
        let (parts, _body) = req.into_parts();

        Box::pin(async move {
            Ok(handle(&querier, &cors, &parts.method, parts.uri.path(), &parts.headers).await)
        })
    }
}

/// Decrements the in-flight gauge even when the request future is dropped
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

async fn handle(
    querier: &ArgoCdQuerier,
    cors: &CorsConfig,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Response<HandlerBody> {
    let _inflight = InflightGuard::new();
    tracing::debug!(%method, path, "Received request");

    let mut response = match Route::from_path(path) {
        None => make_boxed_error_response(StatusCode::NOT_FOUND),
        Some(_) if *method == Method::OPTIONS => preflight_response(),
        Some(_) if *method != Method::GET => {
            let mut response = make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, OPTIONS"));
            response
        }
        Some(Route::ApplicationStatus) => {
            to_response(querier.application_status(bearer_token(headers)).await)
        }
        Some(Route::ListProjects) => {
            to_response(querier.list_projects(bearer_token(headers)).await)
        }
        Some(Route::Health) => make_json_response(
            StatusCode::OK,
            &HealthCheckResponse {
                status_code: StatusCode::OK.as_u16(),
                message: "ok".into(),
            },
        ),
    };

    apply_cors(cors, headers, response.headers_mut());
    response
}

fn to_response<T: Serialize>(
    result: Result<Transformed<T>, GatewayError>,
) -> Response<HandlerBody> {
    match result {
        Ok(transformed) => make_json_response(StatusCode::OK, &transformed.value),
        Err(e) => make_json_response(e.status(), &e.to_body()),
    }
}

fn preflight_response() -> Response<HandlerBody> {
    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("authorization"),
    );
    response
}

/// Echoes the request `Origin` back when it is on the allow list.
fn apply_cors(cors: &CorsConfig, request_headers: &HeaderMap, response_headers: &mut HeaderMap) {
    let Some(origin) = request_headers.get(ORIGIN) else {
        return;
    };
    let allowed = origin
        .to_str()
        .map(|origin| cors.allowed_origins.iter().any(|o| o == origin))
        .unwrap_or(false);

    if allowed {
        response_headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        response_headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
}
