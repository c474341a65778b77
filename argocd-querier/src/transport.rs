use crate::auth::AuthToken;
use crate::config::ArgoCdConfig;
use crate::errors::TransportFailure;
use async_trait::async_trait;
use hyper::body::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use url::Url;

/// Status and body of an upstream response, before validation
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Issues a single authenticated GET. Implementations hold no per-call state
/// and are shared across concurrent requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, token: &AuthToken) -> Result<RawResponse, TransportFailure>;
}

#[derive(thiserror::Error, Debug)]
#[error("could not build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// `reqwest`-backed transport. Clones share one connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ArgoCdConfig) -> Result<Self, ClientBuildError> {
        if config.insecure_skip_tls_verify {
            tracing::warn!(
                server = %config.server,
                "TLS certificate verification is DISABLED for ArgoCD; do not use in production"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure_skip_tls_verify)
            // Redirects are upstream statuses for the validator, not hops to follow
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("argocd-querier/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, token: &AuthToken) -> Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, token.bearer_header())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scheme;
    use crate::testutils::{MockArgoCd, argocd_config};

    #[tokio::test]
    async fn test_get_forwards_bearer_token() {
        let server = MockArgoCd::start(200, r#"{"items":[]}"#).await;
        let transport = ReqwestTransport::new(&argocd_config(server.port())).unwrap();

        let url = Url::parse(&format!("http://127.0.0.1:{}/api/v1/projects", server.port()))
            .unwrap();
        let token = AuthToken::new("token-123").unwrap();
        let response = transport.get(&url, &token).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), br#"{"items":[]}"#);
        assert_eq!(server.hits(), 1);
        assert_eq!(
            server.last_authorization().as_deref(),
            Some("Bearer token-123")
        );
        assert_eq!(server.last_path().as_deref(), Some("/api/v1/projects"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned() {
        let server = MockArgoCd::start(403, "permission denied").await;
        let transport = ReqwestTransport::new(&argocd_config(server.port())).unwrap();

        let url = Url::parse(&format!("http://127.0.0.1:{}/api/v1/projects", server.port()))
            .unwrap();
        let token = AuthToken::new("token").unwrap();
        let response = transport.get(&url, &token).await.unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(response.body.as_ref(), b"permission denied");
    }

    #[tokio::test]
    async fn test_redirect_is_not_followed() {
        let server = MockArgoCd::redirect("/login").await;
        let transport = ReqwestTransport::new(&argocd_config(server.port())).unwrap();

        let url = Url::parse(&format!("http://127.0.0.1:{}/api/v1/projects", server.port()))
            .unwrap();
        let token = AuthToken::new("token").unwrap();
        let response = transport.get(&url, &token).await.unwrap();

        assert_eq!(response.status, 302);
        assert_eq!(server.hits(), 1);
        assert_eq!(server.last_path().as_deref(), Some("/api/v1/projects"));
    }

    #[test]
    fn test_builds_with_tls_verification_disabled() {
        let mut config = argocd_config(443);
        config.scheme = Scheme::Https;
        config.insecure_skip_tls_verify = true;

        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut config = argocd_config(port);
        config.scheme = Scheme::Http;
        let transport = ReqwestTransport::new(&config).unwrap();

        let url = Url::parse(&format!("http://127.0.0.1:{port}/api/v1/projects")).unwrap();
        let token = AuthToken::new("token").unwrap();
        let failure = transport.get(&url, &token).await.unwrap_err();

        assert!(failure.is_retryable());
    }
}
