use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("ArgoCD server cannot be empty")]
    EmptyServer,

    #[error("Request timeout cannot be 0")]
    InvalidTimeout,

    #[error("max_attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("backoff_max_ms ({max}) is smaller than backoff_base_ms ({base})")]
    InvalidBackoff { base: u64, max: u64 },

    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },
}

/// ArgoCD querier configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the `/argocd/*` endpoints
    #[serde(default = "Listener::default_main")]
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    #[serde(default = "Listener::default_admin")]
    pub admin_listener: Listener,
    /// Upstream ArgoCD API server
    pub argocd: ArgoCdConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Config {
    /// Validates the querier configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.argocd.validate()
    }

    /// Applies `ARGOCD_SERVER` / `ARGOCD_PORT` overrides.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup("ARGOCD_SERVER") {
            self.argocd.server = server;
        }

        if let Some(port) = lookup("ARGOCD_PORT") {
            self.argocd.port = port
                .trim()
                .parse()
                .map_err(|_| ValidationError::InvalidOverride {
                    name: "ARGOCD_PORT",
                    value: port.clone(),
                })?;
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    fn default_main() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }

    fn default_admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8001,
        }
    }

    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Https,
    /// Plain HTTP, for local development against a port-forwarded server
    Http,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// Upstream ArgoCD server and the resilience policy applied to calls against it
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ArgoCdConfig {
    /// Hostname of the ArgoCD API server
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub scheme: Scheme,
    /// Per-attempt timeout covering connect, request and body download
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per call, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Disables TLS certificate verification. Never enable this in production.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

fn default_port() -> u16 {
    443
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_backoff_max_ms() -> u64 {
    5000
}

impl ArgoCdConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server.trim().is_empty() {
            return Err(ValidationError::EmptyServer);
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.backoff_max_ms < self.backoff_base_ms {
            return Err(ValidationError::InvalidBackoff {
                base: self.backoff_base_ms,
                max: self.backoff_max_ms,
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL of the API server, e.g. `https://argocd.internal:443/`
    pub fn base_url(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(&format!(
            "{}://{}:{}/",
            self.scheme.as_str(),
            self.server.trim(),
            self.port
        ))
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct CorsConfig {
    /// Origins allowed to call the gateway from a browser
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}
