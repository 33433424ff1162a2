use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Where downloaded headshots end up. Returns the public URL of the stored image.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn store(&self, slug: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Firebase Storage through its REST upload endpoint. Objects land under
/// `nfl-headshots/{slug}.png` and are addressed by a tokenized download URL.
pub struct FirebaseStorage {
    client: reqwest::Client,
    bucket: String,
    api_base: String,
}

const STORAGE_API: &str = "https://firebasestorage.googleapis.com/v0/b";
const OBJECT_PREFIX: &str = "nfl-headshots";

impl FirebaseStorage {
    pub fn new(bucket: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("build storage client")?;
        Ok(Self { client, bucket: bucket.into(), api_base: STORAGE_API.to_string() })
    }

    pub fn object_path(slug: &str) -> String {
        format!("{OBJECT_PREFIX}/{slug}.png")
    }

    fn upload_url(&self, object: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}/o", self.api_base, self.bucket))
            .context("invalid storage bucket")?;
        url.query_pairs_mut().append_pair("name", object);
        Ok(url)
    }

    fn download_url(&self, object: &str, token: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}/o/", self.api_base, self.bucket))
            .context("invalid storage bucket")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("storage url cannot be a base"))?
            .pop_if_empty()
            .push(object);
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url)
    }
}

#[async_trait]
impl ImageStorage for FirebaseStorage {
    async fn store(&self, slug: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let object = Self::object_path(slug);
        let resp = self
            .client
            .post(self.upload_url(&object)?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .context("storage upload failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("storage upload HTTP {}: {}", status, body.chars().take(200).collect::<String>());
        }

        let meta: serde_json::Value = resp.json().await.context("storage upload response")?;
        let token = meta
            .get("downloadTokens")
            .and_then(|t| t.as_str())
            .and_then(|t| t.split(',').next())
            .context("storage response has no download token")?;

        let url = self.download_url(&object, token)?;
        debug!("uploaded {} to {}", object, self.bucket);
        Ok(url.to_string())
    }

    fn name(&self) -> &'static str {
        "firebase-storage"
    }
}

/// Writes `{slug}.png` into a directory the server exposes at `public_prefix`.
pub struct LocalDirStorage {
    dir: PathBuf,
    public_prefix: String,
}

impl LocalDirStorage {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl ImageStorage for LocalDirStorage {
    async fn store(&self, slug: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create {}", self.dir.display()))?;
        let file = format!("{slug}.png");
        tokio::fs::write(self.dir.join(&file), bytes)
            .await
            .with_context(|| format!("write headshot {file}"))?;
        Ok(format!("{}/{}", self.public_prefix, file))
    }

    fn name(&self) -> &'static str {
        "local-dir"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firebase_urls_encode_object_path() {
        let fs = FirebaseStorage::new("futures-demo.appspot.com").unwrap();
        let up = fs.upload_url(&FirebaseStorage::object_path("josh-allen")).unwrap();
        assert_eq!(
            up.as_str(),
            "https://firebasestorage.googleapis.com/v0/b/futures-demo.appspot.com/o?name=nfl-headshots%2Fjosh-allen.png"
        );

        let down = fs.download_url("nfl-headshots/josh-allen.png", "tok-1").unwrap();
        assert_eq!(
            down.as_str(),
            "https://firebasestorage.googleapis.com/v0/b/futures-demo.appspot.com/o/nfl-headshots%2Fjosh-allen.png?alt=media&token=tok-1"
        );
    }

    #[tokio::test]
    async fn local_dir_writes_png() {
        let dir = std::env::temp_dir().join(format!("headshots-{}", std::process::id()));
        let storage = LocalDirStorage::new(&dir, "/headshots/");
        let url = storage.store("ja-marr-chase", vec![0x89, b'P', b'N', b'G'], "image/png").await.unwrap();
        assert_eq!(url, "/headshots/ja-marr-chase.png");
        assert_eq!(std::fs::read(dir.join("ja-marr-chase.png")).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }
}
