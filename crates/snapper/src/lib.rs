//! Headless-browser screenshots of a page or one DOM region, as PNG bytes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

mod chrome;

pub use chrome::ChromeSnapper;

pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1350;
pub const DEFAULT_WAIT_MS: u64 = 1200;

const MIN_SIDE: u32 = 200;
const MAX_SIDE: u32 = 4000;
const MAX_WAIT_MS: u64 = 15_000;

#[derive(Debug, Error)]
pub enum SnapError {
    #[error("missing_url")]
    MissingUrl,

    #[error("invalid_url: {0}")]
    InvalidUrl(String),

    #[error("snapshot timed out after {0:?}")]
    Timeout(Duration),

    #[error("snapshot failed: {0}")]
    Failed(String),
}

impl From<anyhow::Error> for SnapError {
    fn from(e: anyhow::Error) -> Self {
        SnapError::Failed(format!("{e:#}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapRequest {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub wait_ms: u64,
    /// Capture only this element when it appears; the viewport otherwise.
    pub selector: Option<String>,
    pub full_page: bool,
}

impl SnapRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            wait_ms: DEFAULT_WAIT_MS,
            selector: None,
            full_page: false,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn clamped(mut self) -> Self {
        self.width = self.width.clamp(MIN_SIDE, MAX_SIDE);
        self.height = self.height.clamp(MIN_SIDE, MAX_SIDE);
        self.wait_ms = self.wait_ms.min(MAX_WAIT_MS);
        self
    }
}

/// Raw `/api/snap` query. Unparseable numbers fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct SnapParams {
    pub url: Option<String>,
    pub w: Option<String>,
    pub h: Option<String>,
    pub wait: Option<String>,
    pub sel: Option<String>,
    pub full: Option<String>,
}

impl SnapParams {
    pub fn into_request(self) -> Result<SnapRequest, SnapError> {
        let raw = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(SnapError::MissingUrl)?;

        let parsed = Url::parse(&raw).map_err(|e| SnapError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(SnapError::InvalidUrl(format!("unsupported url {raw}")));
        }

        fn num<T: std::str::FromStr>(v: Option<String>, default: T) -> T {
            v.and_then(|s| s.trim().parse::<f64>().ok().map(|f| f.max(0.0).round().to_string()))
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        }

        let mut req = SnapRequest::new(parsed.to_string());
        req.width = num(self.w, DEFAULT_WIDTH);
        req.height = num(self.h, DEFAULT_HEIGHT);
        req.wait_ms = num(self.wait, DEFAULT_WAIT_MS);
        req.selector = self.sel.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        req.full_page = matches!(self.full.as_deref().map(str::trim), Some("1" | "true" | "yes"));
        Ok(req.clamped())
    }
}

#[async_trait]
pub trait Snapper: Send + Sync {
    async fn capture(&self, req: &SnapRequest) -> Result<Vec<u8>, SnapError>;
}

/// Run any snapper under an overall deadline. The browser behind a timed-out capture
/// keeps running on its blocking thread until its own bounded waits expire.
pub async fn capture_with_deadline(
    snapper: &dyn Snapper,
    req: &SnapRequest,
    deadline: Duration,
) -> Result<Vec<u8>, SnapError> {
    let started = Instant::now();
    match tokio::time::timeout(deadline, snapper.capture(req)).await {
        Ok(Ok(png)) => {
            debug!("snap {} ok: {} bytes in {:?}", req.url, png.len(), started.elapsed());
            Ok(png)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            warn!("snap {} exceeded {:?}", req.url, deadline);
            Err(SnapError::Timeout(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowSnapper(Duration);

    #[async_trait]
    impl Snapper for SlowSnapper {
        async fn capture(&self, _req: &SnapRequest) -> Result<Vec<u8>, SnapError> {
            tokio::time::sleep(self.0).await;
            Ok(vec![1, 2, 3])
        }
    }

    fn params(url: Option<&str>) -> SnapParams {
        SnapParams { url: url.map(str::to_string), ..Default::default() }
    }

    #[test]
    fn defaults_apply() {
        let req = params(Some("https://example.com/futures")).into_request().unwrap();
        assert_eq!(req.width, 1080);
        assert_eq!(req.height, 1350);
        assert_eq!(req.wait_ms, 1200);
        assert_eq!(req.selector, None);
        assert!(!req.full_page);
    }

    #[test]
    fn values_are_clamped() {
        let mut p = params(Some("http://localhost:3001/futures"));
        p.w = Some("50".into());
        p.h = Some("99999".into());
        p.wait = Some("60000".into());
        p.sel = Some("  #futures-modal ".into());
        p.full = Some("1".into());
        let req = p.into_request().unwrap();
        assert_eq!((req.width, req.height, req.wait_ms), (200, 4000, 15_000));
        assert_eq!(req.selector.as_deref(), Some("#futures-modal"));
        assert!(req.full_page);
    }

    #[test]
    fn url_is_required_and_validated() {
        assert!(matches!(params(None).into_request(), Err(SnapError::MissingUrl)));
        assert!(matches!(params(Some("  ")).into_request(), Err(SnapError::MissingUrl)));
        assert!(matches!(params(Some("not a url")).into_request(), Err(SnapError::InvalidUrl(_))));
        assert!(matches!(params(Some("file:///etc/passwd")).into_request(), Err(SnapError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn deadline_cuts_off_slow_capture() {
        let slow = SlowSnapper(Duration::from_secs(5));
        let req = SnapRequest::new("http://10.255.255.1/");
        let started = Instant::now();
        let err = capture_with_deadline(&slow, &req, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapError::Timeout(_)));
        assert!(started.elapsed() < Duration::from_secs(2));

        let fast = SlowSnapper(Duration::from_millis(1));
        let png = capture_with_deadline(&fast, &req, Duration::from_secs(1)).await.unwrap();
        assert_eq!(png, vec![1, 2, 3]);
    }
}
