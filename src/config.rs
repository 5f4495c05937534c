use crate::models::LookupOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Transport settings applied uniformly to every outbound request.
///
/// Paths are read once, when the gateway is built at startup.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Client certificate (PEM), or a PKCS#12 archive when `passphrase` is set.
    pub cert: Option<PathBuf>,
    /// Private key (PEM, PKCS#8) matching `cert`.
    pub key: Option<PathBuf>,
    pub passphrase: Option<String>,
    /// Extra CA bundle (PEM) trusted in addition to the system roots.
    pub ca: Option<PathBuf>,
    pub proxy: Option<String>,
    /// `Some(false)` turns off certificate verification.
    pub reject_unauthorized: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub lookup: LookupOptions,
    pub request: RequestConfig,
    /// `None` disables the token cache: every batch exchanges credentials.
    pub token_cache_ttl: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_source<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let proxy = var("REQUEST_PROXY")
            .map(|proxy| {
                url::Url::parse(&proxy).map_err(|e| {
                    anyhow::anyhow!("REQUEST_PROXY must be a valid URL ({}): {}", e, proxy)
                })?;
                Ok::<_, anyhow::Error>(proxy)
            })
            .transpose()?;

        let reject_unauthorized = var("REQUEST_REJECT_UNAUTHORIZED")
            .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => anyhow::bail!("REQUEST_REJECT_UNAUTHORIZED must be a boolean, got '{}'", raw),
            })
            .transpose()?;

        let token_cache_ttl = match var("TOKEN_CACHE_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("TOKEN_CACHE_TTL_SECS must be a non-negative integer")
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let host = var("SPOTTER_HOST")
            .map(|host| {
                if !host.starts_with("http://") && !host.starts_with("https://") {
                    anyhow::bail!("SPOTTER_HOST must start with http:// or https://");
                }
                Ok(host)
            })
            .transpose()?;

        let config = Self {
            lookup: LookupOptions {
                host,
                username: var("SPOTTER_USERNAME"),
                password: var("SPOTTER_PASSWORD"),
                tenant: var("SPOTTER_TENANT"),
                token: var("SPOTTER_TOKEN"),
            },
            request: RequestConfig {
                cert: var("REQUEST_CERT").map(PathBuf::from),
                key: var("REQUEST_KEY").map(PathBuf::from),
                passphrase: var("REQUEST_PASSPHRASE"),
                ca: var("REQUEST_CA").map(PathBuf::from),
                proxy,
                reject_unauthorized,
            },
            token_cache_ttl,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        if let Some(ref host) = config.lookup.host {
            tracing::debug!("Search host: {}", host);
        }
        if let Some(ref proxy) = config.request.proxy {
            tracing::debug!("Proxy configured: {}", proxy);
        }
        if let Some(ttl) = config.token_cache_ttl {
            tracing::debug!("Token cache TTL: {}s", ttl.as_secs());
        }

        Ok(config)
    }
}
