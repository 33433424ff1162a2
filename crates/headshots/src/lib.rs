//! NFL headshot fetcher
//!
//! Player page: https://www.nfl.com/players/<slug>/
//! The image URL usually sits in `<meta property="og:image">`; older layouts carry it
//! on `.nfl-c-player-header__headshot img`.
//!
//! Flow: cache → HTTP fetch (browser fallback on 403) → players index search on 404
//! → selector extraction → download → upload → cache.

pub mod cache;
pub mod storage;

pub use cache::HeadshotCache;
pub use storage::{FirebaseStorage, ImageStorage, LocalDirStorage};

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions};
use reqwest::{StatusCode, Url};
use scraper::{Html, Selector};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, info, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const NFL_ORIGIN: &str = "https://www.nfl.com";

const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
];

/// Image selectors in priority order. `meta` carries the URL in `content`, `img` in `src`.
const HEADSHOT_SELECTORS: [&str; 6] = [
    r#"meta[property="og:image"]"#,
    ".nfl-c-player-header__headshot img",
    ".player-headshot img",
    r#"img[alt*="headshot"]"#,
    r#"img[src*="headshot"]"#,
    ".nfl-o-player-image img",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadshotResult {
    pub url: String,
    pub cached: bool,
}

/// Player page fetch outcome. 404 is a distinct state because it triggers the search.
#[derive(Debug)]
enum Page {
    Html(String),
    NotFound,
}

/// `"Ja'Marr Chase"` → `"ja-marr-chase"`, `"Amon-Ra St. Brown"` → `"amon-ra-st-brown"`.
pub fn slugify(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// First absolute image URL found by the prioritized selectors, then by any `img`
/// whose `src` looks like a player image.
pub fn extract_headshot_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for css in HEADSHOT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(el) = document.select(&selector).next() {
            let v = el.value();
            let url = v.attr("content").or_else(|| v.attr("src"));
            if let Some(url) = url.map(str::trim).filter(|u| u.starts_with("http")) {
                debug!("headshot matched selector {}", css);
                return Some(url.to_string());
            }
        }
    }

    let img = Selector::parse("img").ok()?;
    document
        .select(&img)
        .filter_map(|el| el.value().attr("src"))
        .map(str::trim)
        .find(|src| {
            src.starts_with("http")
                && (src.contains("headshot") || src.contains("player") || src.contains("nfl"))
        })
        .map(str::to_string)
}

/// Href of the first `<a>` whose visible text equals `name` (trimmed, case-insensitive),
/// resolved against `base`.
pub fn find_player_link(html: &str, name: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").ok()?;
    let want = name.trim().to_lowercase();

    document
        .select(&anchors)
        .find(|a| a.text().collect::<String>().trim().to_lowercase() == want)
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok())
}

pub struct HeadshotFetcher {
    client: reqwest::Client,
    cache: HeadshotCache,
    storage: Arc<dyn ImageStorage>,
    origin: Url,
    chrome_path: Option<PathBuf>,
    ua_index: AtomicUsize,
}

impl HeadshotFetcher {
    pub fn new(cache: HeadshotCache, storage: Arc<dyn ImageStorage>) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8".parse()?,
        );
        headers.insert(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5".parse()?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .gzip(true)
            .build()
            .context("build headshot http client")?;

        Ok(Self {
            client,
            cache,
            storage,
            origin: Url::parse(NFL_ORIGIN)?,
            chrome_path: None,
            ua_index: AtomicUsize::new(0),
        })
    }

    pub fn with_chrome_path(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_path = path;
        self
    }

    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    pub fn cache(&self) -> &HeadshotCache {
        &self.cache
    }

    /// Cached or freshly scraped headshot URL. Every failure resolves to `None`.
    pub async fn fetch(&self, name: &str) -> Option<HeadshotResult> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        match self.cache.get(name) {
            Ok(Some(url)) => return Some(HeadshotResult { url, cached: true }),
            Ok(None) => {}
            Err(e) => warn!("headshot cache read failed for {}: {:#}", name, e),
        }

        match self.scrape(name).await {
            Ok(Some(url)) => {
                if let Err(e) = self.cache.put(name, &url) {
                    warn!("headshot cache write failed for {}: {:#}", name, e);
                }
                info!("📸 headshot saved: {} → {}", name, url);
                Some(HeadshotResult { url, cached: false })
            }
            Ok(None) => {
                info!("no headshot found for {}", name);
                None
            }
            Err(e) => {
                warn!("headshot fetch failed for {}: {:#}", name, e);
                None
            }
        }
    }

    async fn scrape(&self, name: &str) -> Result<Option<String>> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Ok(None);
        }

        let player_url = self.origin.join(&format!("/players/{slug}/"))?;
        let html = match self.fetch_page(&player_url).await? {
            Page::Html(html) => html,
            Page::NotFound => {
                debug!("player page 404 for {}, searching index", name);
                let index_url = self.origin.join("/players/")?;
                let Page::Html(index) = self.fetch_page(&index_url).await? else {
                    return Ok(None);
                };
                let Some(link) = find_player_link(&index, name, &self.origin) else {
                    return Ok(None);
                };
                match self.fetch_page(&link).await? {
                    Page::Html(html) => html,
                    Page::NotFound => return Ok(None),
                }
            }
        };

        let Some(img_url) = extract_headshot_url(&html) else {
            return Ok(None);
        };

        let (bytes, content_type) = self.download(&img_url).await?;
        debug!("downloaded {} bytes for {}", bytes.len(), name);
        let url = self.storage.store(&slug, bytes, &content_type).await?;
        Ok(Some(url))
    }

    fn next_user_agent(&self) -> &'static str {
        let i = self.ua_index.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[i % USER_AGENTS.len()]
    }

    async fn fetch_page(&self, url: &Url) -> Result<Page> {
        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, self.next_user_agent())
            .send()
            .await
            .with_context(|| format!("request failed for {}", url))?;

        match resp.status() {
            s if s.is_success() => Ok(Page::Html(resp.text().await?)),
            StatusCode::NOT_FOUND => Ok(Page::NotFound),
            StatusCode::FORBIDDEN => {
                warn!("HTTP 403 on {}, trying browser fallback", url);
                Ok(Page::Html(self.fetch_html_browser(url).await?))
            }
            s => Err(anyhow::anyhow!("HTTP {} for {}", s, url)),
        }
    }

    async fn fetch_html_browser(&self, url: &Url) -> Result<String> {
        let url = url.to_string();
        let chrome_path = self.chrome_path.clone();
        let user_agent = self.next_user_agent();

        task::spawn_blocking(move || -> Result<String> {
            let options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false)
                .path(chrome_path)
                .window_size(Some((1280, 720)))
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build Chrome launch options: {e}"))?;

            let browser = Browser::new(options).context("Failed to launch Chrome")?;
            let tab = browser.new_tab().context("Failed to create browser tab")?;
            tab.set_default_timeout(Duration::from_secs(15));
            tab.set_user_agent(user_agent, None, None)
                .context("Failed to set user agent")?;

            tab.navigate_to(&url).context("Chrome navigate failed")?;
            tab.wait_until_navigated().context("Chrome navigation did not settle")?;
            tab.wait_for_element("body").context("Chrome wait_for_element(body) failed")?;
            std::thread::sleep(Duration::from_millis(1500));

            tab.get_content().context("Failed to read HTML from browser tab")
        })
        .await?
    }

    async fn download(&self, img_url: &str) -> Result<(Vec<u8>, String)> {
        let resp = self
            .client
            .get(img_url)
            .header(reqwest::header::USER_AGENT, USER_AGENTS[0])
            .send()
            .await
            .with_context(|| format!("image request failed for {}", img_url))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("image HTTP {} for {}", status, img_url);
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();
        let bytes = resp.bytes().await?.to_vec();
        if bytes.is_empty() {
            anyhow::bail!("empty image body from {}", img_url);
        }
        Ok((bytes, content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoStorage;

    #[async_trait]
    impl ImageStorage for NoStorage {
        async fn store(&self, _slug: &str, _bytes: Vec<u8>, _ct: &str) -> Result<String> {
            anyhow::bail!("storage disabled in tests")
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    #[test]
    fn slugify_folds_accents_and_punctuation() {
        assert_eq!(slugify("Patrick Mahomes"), "patrick-mahomes");
        assert_eq!(slugify("Ja'Marr Chase"), "ja-marr-chase");
        assert_eq!(slugify("  Amon-Ra St. Brown "), "amon-ra-st-brown");
        assert_eq!(slugify("José Ramírez"), "jose-ramirez");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn og_image_wins_over_img_tags() {
        let html = r#"
            <html><head>
              <meta property="og:image" content="https://static.www.nfl.com/image/headshots/pm.png">
            </head><body>
              <div class="nfl-c-player-header__headshot"><img src="https://static.www.nfl.com/other.png"></div>
            </body></html>"#;
        assert_eq!(
            extract_headshot_url(html).as_deref(),
            Some("https://static.www.nfl.com/image/headshots/pm.png")
        );
    }

    #[test]
    fn relative_urls_are_skipped_until_fallback() {
        let html = r#"
            <html><body>
              <div class="player-headshot"><img src="/img/local.png"></div>
              <img src="https://cdn.example.com/logo.svg">
              <img src="https://static.www.nfl.com/players/allen.jpg">
            </body></html>"#;
        assert_eq!(
            extract_headshot_url(html).as_deref(),
            Some("https://static.www.nfl.com/players/allen.jpg")
        );
        assert_eq!(extract_headshot_url("<html><body><p>none</p></body></html>"), None);
    }

    #[test]
    fn player_link_is_matched_by_text() {
        let base = Url::parse(NFL_ORIGIN).unwrap();
        let html = r#"
            <ul>
              <li><a href="/players/josh-allen-4/">Josh Allen</a></li>
              <li><a href="/players/patrick-mahomes/"> PATRICK MAHOMES </a></li>
            </ul>"#;
        assert_eq!(
            find_player_link(html, "Patrick Mahomes", &base).unwrap().as_str(),
            "https://www.nfl.com/players/patrick-mahomes/"
        );
        assert_eq!(
            find_player_link(html, "Josh Allen", &base).unwrap().as_str(),
            "https://www.nfl.com/players/josh-allen-4/"
        );
        assert!(find_player_link(html, "Joe Burrow", &base).is_none());
    }

    #[tokio::test]
    async fn cache_hit_skips_network() {
        let cache = HeadshotCache::open_in_memory().unwrap();
        cache.put("Josh Allen", "https://img/ja.png").unwrap();
        let fetcher = HeadshotFetcher::new(cache, Arc::new(NoStorage)).unwrap();

        let hit = fetcher.fetch(" Josh Allen ").await.unwrap();
        assert_eq!(hit, HeadshotResult { url: "https://img/ja.png".into(), cached: true });
        assert!(fetcher.fetch("   ").await.is_none());
    }
}
