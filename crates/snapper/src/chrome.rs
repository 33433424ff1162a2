use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::task;
use tracing::{debug, info, warn};

use crate::{SnapError, SnapRequest, Snapper};

/// One Chrome process per capture, driven on a blocking thread.
#[derive(Debug, Clone)]
pub struct ChromeSnapper {
    chrome_path: Option<PathBuf>,
    nav_timeout: Duration,
    selector_timeout: Duration,
}

impl Default for ChromeSnapper {
    fn default() -> Self {
        Self {
            chrome_path: None,
            nav_timeout: Duration::from_secs(20),
            selector_timeout: Duration::from_secs(10),
        }
    }
}

/// Owns the browser; the Chrome process is killed when this drops, on every exit path.
struct BrowserSession {
    browser: Browser,
    url: String,
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        debug!("closing browser for {}", self.url);
    }
}

impl ChromeSnapper {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path, ..Self::default() }
    }

    pub fn with_timeouts(mut self, nav: Duration, selector: Duration) -> Self {
        self.nav_timeout = nav;
        self.selector_timeout = selector;
        self
    }

    fn launch(&self, req: &SnapRequest) -> Result<BrowserSession> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .window_size(Some((req.width, req.height)))
            .idle_browser_timeout(self.nav_timeout + self.selector_timeout + Duration::from_millis(req.wait_ms) + Duration::from_secs(10))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build Chrome launch options: {e}"))?;

        let browser = Browser::new(options).context("Failed to launch Chrome")?;
        Ok(BrowserSession { browser, url: req.url.clone() })
    }

    fn capture_blocking(&self, req: &SnapRequest) -> Result<Vec<u8>> {
        let session = self.launch(req)?;
        let tab = session.browser.new_tab().context("Failed to create browser tab")?;
        tab.set_default_timeout(self.nav_timeout);

        info!("📸 navigating to {}", req.url);
        tab.navigate_to(&req.url).context("Chrome navigate failed")?;
        tab.wait_until_navigated().context("Chrome navigation did not settle")?;

        if req.wait_ms > 0 {
            std::thread::sleep(Duration::from_millis(req.wait_ms));
        }

        if let (Some(sel), false) = (req.selector.as_deref(), req.full_page) {
            match tab.wait_for_element_with_custom_timeout(sel, self.selector_timeout) {
                Ok(el) => {
                    return el
                        .capture_screenshot(CaptureScreenshotFormatOption::Png)
                        .context("element screenshot failed");
                }
                Err(e) => {
                    warn!("selector {} not found on {} ({}), falling back to viewport", sel, req.url, e);
                }
            }
        }

        if req.full_page {
            let clip = full_page_clip(&tab, req)?;
            return tab
                .capture_screenshot(CaptureScreenshotFormatOption::Png, None, Some(clip), true)
                .context("full page screenshot failed");
        }

        tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .context("viewport screenshot failed")
    }
}

/// Document size measured in the page, never smaller than the window.
fn full_page_clip(tab: &Tab, req: &SnapRequest) -> Result<Viewport> {
    let measured = tab
        .evaluate(
            "JSON.stringify([document.documentElement.scrollWidth, document.documentElement.scrollHeight])",
            false,
        )
        .context("measure document failed")?;

    let (w, h) = measured
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| serde_json::from_str::<(f64, f64)>(s).ok())
        .unwrap_or((req.width as f64, req.height as f64));

    Ok(Viewport {
        x: 0.0,
        y: 0.0,
        width: w.max(req.width as f64),
        height: h.max(req.height as f64),
        scale: 1.0,
    })
}

#[async_trait]
impl Snapper for ChromeSnapper {
    async fn capture(&self, req: &SnapRequest) -> Result<Vec<u8>, SnapError> {
        let this = self.clone();
        let req = req.clone();

        let png = task::spawn_blocking(move || -> Result<Vec<u8>> { this.capture_blocking(&req) })
            .await
            .map_err(|e| SnapError::Failed(format!("snapshot task panicked: {e}")))??;

        if png.is_empty() {
            return Err(SnapError::Failed("empty screenshot".into()));
        }
        Ok(png)
    }
}
