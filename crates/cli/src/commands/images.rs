use anyhow::{Context, Result};
use async_trait::async_trait;
use folio_content::{ContentSource, HttpContentSource, PostQuery};
use folio_core::config::CONFIG_FILE;
use folio_core::{Post, SiteConfig, parse_site_toml};
use image::GenericImageView;
use std::fs;
use std::path::{Path, PathBuf};

/// Pixel size requested from the image host
const IMAGE_SIZE: u32 = 1200;

/// Fetches raw image bytes
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> folio_core::Result<Vec<u8>>;
}

#[async_trait]
impl ImageFetcher for HttpContentSource {
    async fn fetch(&self, url: &str) -> folio_core::Result<Vec<u8>> {
        self.download(url).await
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
}

/// Download share images for posts that have a local filename mapping.
///
/// Posts without an image or a mapping are skipped, as are images that
/// fail to download or decode. Failing to list posts is an error.
pub async fn run(path: PathBuf) -> Result<()> {
    println!("🖼  Downloading post images...");

    let config = parse_site_toml(path.join(CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;
    let source = HttpContentSource::new(&config.api.base_url)?;

    let summary = download_images(&path, &config, &source, &source).await?;

    println!();
    println!("✅ Complete");
    println!("   Downloaded: {} images", summary.downloaded);
    println!("   Skipped: {} posts", summary.skipped);
    println!("   Saved to: {}", config.images_dir(&path).display());

    if summary.downloaded > 0 {
        println!("\nRun 'folio build {}' to regenerate post pages", path.display());
    } else {
        println!("\n⚠️  No images were downloaded");
    }

    Ok(())
}

pub(crate) async fn download_images<S, F>(
    root: &Path,
    config: &SiteConfig,
    source: &S,
    fetcher: &F,
) -> Result<DownloadSummary>
where
    S: ContentSource + ?Sized,
    F: ImageFetcher + ?Sized,
{
    let posts = source
        .list_posts(&PostQuery::without_content())
        .await
        .context("Failed to fetch posts")?;

    if posts.is_empty() {
        println!("   No posts found");
        return Ok(DownloadSummary::default());
    }
    println!("   Found {} posts\n", posts.len());

    let images_dir = config.images_dir(root);
    let mut summary = DownloadSummary::default();

    for post in &posts {
        let Some((url, filename)) = image_target(post, config) else {
            summary.skipped += 1;
            continue;
        };

        match save_image(fetcher, &url, &images_dir.join(filename)).await {
            Ok((width, height)) => {
                println!("   ✓ {} ({}x{})", filename.display(), width, height);
                summary.downloaded += 1;
            }
            Err(e) => {
                println!("   ⚠ Failed to download {}: {:#}", filename.display(), e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Remote URL and local filename for a post's image, if both exist
fn image_target<'a>(post: &Post, config: &'a SiteConfig) -> Option<(String, &'a Path)> {
    let url = post.image.as_ref()?.remote_url(IMAGE_SIZE)?;
    match config.images.get(&post.slug) {
        Some(filename) => Some((url, filename.as_path())),
        None => {
            println!("   Skipped (no filename mapping): {}", post.slug);
            None
        }
    }
}

/// Fetch, check it decodes as an image, write. Returns the dimensions.
async fn save_image<F>(fetcher: &F, url: &str, dest: &Path) -> Result<(u32, u32)>
where
    F: ImageFetcher + ?Sized,
{
    let bytes = fetcher.fetch(url).await?;
    let img = image::load_from_memory(&bytes).context("Downloaded file is not an image")?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    Ok(img.dimensions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Error, parse_site_toml_str};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const SITE: &str = r#"
[site]
base_url = "https://example.com"
author = "Sam"

[api]
base_url = "https://api.example.com/exec"

[images]
"with-drive" = "with-drive.jpg"
"broken" = "broken.jpg"
"missing" = "missing.jpg"
"#;

    struct FakeRemote {
        posts: Option<Vec<Post>>,
        files: HashMap<String, Vec<u8>>,
        fetched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentSource for FakeRemote {
        async fn list_posts(&self, query: &PostQuery) -> folio_core::Result<Vec<Post>> {
            assert_eq!(query.content, Some(false));
            self.posts
                .clone()
                .ok_or_else(|| Error::Http("HTTP error! status: 500".to_string()))
        }

        async fn post_by_slug(&self, _slug: &str) -> folio_core::Result<Post> {
            Err(Error::Api("Post not found".to_string()))
        }

        async fn post_by_id(&self, _id: &str) -> folio_core::Result<Post> {
            Err(Error::Api("Post not found".to_string()))
        }
    }

    #[async_trait]
    impl ImageFetcher for FakeRemote {
        async fn fetch(&self, url: &str) -> folio_core::Result<Vec<u8>> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Http("Failed to download image: 404".to_string()))
        }
    }

    fn png() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(4, 3))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn post(slug: &str, image: serde_json::Value) -> Post {
        serde_json::from_value(serde_json::json!({
            "slug": slug,
            "title": slug,
            "image": image,
        }))
        .unwrap()
    }

    fn remote(posts: Option<Vec<Post>>) -> FakeRemote {
        let mut files = HashMap::new();
        files.insert(
            "https://drive.google.com/thumbnail?id=abc&sz=s1200".to_string(),
            png(),
        );
        files.insert("https://cdn.example.com/broken.jpg".to_string(), b"not an image".to_vec());
        FakeRemote {
            posts,
            files,
            fetched: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_downloads_mapped_images_and_counts_skips() {
        let dir = TempDir::new().unwrap();
        let config = parse_site_toml_str(SITE).unwrap();
        let remote = remote(Some(vec![
            post("with-drive", serde_json::json!({"driveId": "abc"})),
            post("unmapped", serde_json::json!({"driveId": "zzz"})),
            post("no-image", serde_json::Value::Null),
            post("broken", serde_json::json!({"url": "https://cdn.example.com/broken.jpg"})),
            post("missing", serde_json::json!({"url": "https://cdn.example.com/missing.jpg"})),
        ]));

        let summary = download_images(dir.path(), &config, &remote, &remote)
            .await
            .unwrap();

        assert_eq!(summary, DownloadSummary { downloaded: 1, skipped: 4 });

        let images = config.images_dir(dir.path());
        assert_eq!(fs::read(images.join("with-drive.jpg")).unwrap(), png());
        assert!(!images.join("broken.jpg").exists());
        assert!(!images.join("missing.jpg").exists());

        // Unmapped posts are never fetched
        assert_eq!(remote.fetched.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_no_posts() {
        let dir = TempDir::new().unwrap();
        let config = parse_site_toml_str(SITE).unwrap();
        let remote = remote(Some(vec![]));

        let summary = download_images(dir.path(), &config, &remote, &remote)
            .await
            .unwrap();
        assert_eq!(summary, DownloadSummary::default());
    }

    #[tokio::test]
    async fn test_listing_failure_is_error() {
        let dir = TempDir::new().unwrap();
        let config = parse_site_toml_str(SITE).unwrap();
        let remote = remote(None);

        let err = download_images(dir.path(), &config, &remote, &remote)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to fetch posts"));
    }
}
