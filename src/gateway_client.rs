use crate::config::RequestConfig;
use crate::errors::{AppError, RequestError, ResponseStatus};
use reqwest::{Certificate, Identity, Method};
use serde_json::Value;
use std::path::Path;

/// One outbound request: method, URL, query string and headers.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Joins an endpoint path onto the configured host.
pub fn endpoint(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}

/// HTTP client with fixed TLS/proxy settings and a status-code contract.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted, so
/// clones share one connection pool.
#[derive(Clone)]
pub struct RequestGateway {
    client: reqwest::Client,
}

impl RequestGateway {
    /// Builds the gateway, reading any TLS material from disk once.
    ///
    /// Unreadable files, a key without a certificate, or an invalid proxy URL
    /// fail with [`AppError::ConfigError`].
    pub fn from_config(config: &RequestConfig) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();

        match (&config.cert, &config.key, &config.passphrase) {
            (Some(cert), _, Some(passphrase)) => {
                let archive = read_file(cert, "client certificate")?;
                let identity = Identity::from_pkcs12_der(&archive, passphrase).map_err(|e| {
                    AppError::ConfigError(format!("Invalid PKCS#12 client certificate: {}", e))
                })?;
                builder = builder.identity(identity);
                tracing::debug!("Client identity loaded from PKCS#12 archive {}", cert.display());
            }
            (Some(cert), Some(key), None) => {
                let cert_pem = read_file(cert, "client certificate")?;
                let key_pem = read_file(key, "private key")?;
                let identity = Identity::from_pkcs8_pem(&cert_pem, &key_pem).map_err(|e| {
                    AppError::ConfigError(format!("Invalid client certificate or key: {}", e))
                })?;
                builder = builder.identity(identity);
                tracing::debug!("Client identity loaded from {}", cert.display());
            }
            (Some(_), None, None) => {
                return Err(AppError::ConfigError(
                    "Client certificate requires a private key or a passphrase".to_string(),
                ));
            }
            (None, Some(_), _) => {
                return Err(AppError::ConfigError(
                    "Private key configured without a client certificate".to_string(),
                ));
            }
            (None, None, _) => {}
        }

        if let Some(ref ca) = config.ca {
            let pem = read_file(ca, "CA bundle")?;
            let certs = Certificate::from_pem_bundle(&pem)
                .map_err(|e| AppError::ConfigError(format!("Invalid CA bundle: {}", e)))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| AppError::ConfigError(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        if config.reject_unauthorized == Some(false) {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Sends a request and checks the response status against `expected_status`.
    ///
    /// The body is parsed as JSON; a body that is not JSON comes back as a
    /// JSON string. Failures are logged with the request URL.
    pub async fn send(&self, request: RequestSpec, expected_status: u16) -> Result<Value, RequestError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = RequestError::transport(e.to_string());
                tracing::error!(
                    "error during http request to {}: status={} error={}",
                    request.url,
                    err.status_code,
                    e
                );
                return Err(err);
            }
        };

        let status = response.status().as_u16();
        if status != expected_status {
            let err = RequestError::status_mismatch(status, expected_status);
            tracing::error!(
                "error during http request to {}: status={} expected={}",
                request.url,
                status,
                expected_status
            );
            return Err(err);
        }

        let text = response.text().await.map_err(|e| {
            tracing::error!(
                "error reading response body from {}: status={} error={}",
                request.url,
                status,
                e
            );
            RequestError {
                error: Some(format!("failed to read response body: {}", e)),
                status_code: ResponseStatus::Code(status),
            }
        })?;

        Ok(parse_body(text))
    }
}

fn read_file(path: &Path, what: &str) -> Result<Vec<u8>, AppError> {
    std::fs::read(path).map_err(|e| {
        AppError::ConfigError(format!("Failed to read {} {}: {}", what, path.display(), e))
    })
}

fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
