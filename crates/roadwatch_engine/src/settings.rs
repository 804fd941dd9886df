use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use roadwatch_logging::rw_warn;
use url::Url;

use crate::ApiError;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Origin of the backend; API paths and the push endpoint derive from it.
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Uploads can be large, so they get their own, longer, timeout.
    pub upload_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    pub notification_ttl: Duration,
    /// `None` disables `/api/status` polling.
    pub status_poll_interval: Option<Duration>,
    pub download_dir: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:8000/").expect("static url"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            reconnect: ReconnectPolicy::default(),
            notification_ttl: Duration::from_millis(4000),
            status_poll_interval: None,
            download_dir: PathBuf::from("downloads"),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Push endpoint on the same host, scheme matched to the backend.
    pub fn push_endpoint(&self) -> Result<Url, ApiError> {
        push_endpoint(&self.base_url)
    }

    /// Absolute URL for a server-relative path such as `/outputs/clip.avi`.
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))
    }
}

/// Parses the backend origin. Every endpoint lives at the host root, so any
/// path, query or fragment is dropped.
pub fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw).map_err(|err| ApiError::InvalidUrl(format!("{raw}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(ApiError::InvalidUrl(format!(
            "{raw}: expected an http or https origin"
        )));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        rw_warn!("Ignoring path of backend url {}; endpoints are served from the root", raw);
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
    }
    Ok(url)
}

pub fn push_endpoint(base: &Url) -> Result<Url, ApiError> {
    let scheme = match base.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(ApiError::InvalidUrl(format!(
                "no push scheme for {other}"
            )))
        }
    };
    let host = base
        .host_str()
        .ok_or_else(|| ApiError::InvalidUrl(format!("{base} has no host")))?;
    let authority = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Url::parse(&format!("{scheme}://{authority}/ws"))
        .map_err(|err| ApiError::InvalidUrl(err.to_string()))
}

/// Fixed reconnect delay with optional uniform jitter. Retries never stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub jitter: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(3000),
            jitter: Duration::ZERO,
        }
    }
}

impl ReconnectPolicy {
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        self.delay + Duration::from_millis(extra)
    }
}
