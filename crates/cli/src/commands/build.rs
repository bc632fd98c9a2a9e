use anyhow::{Context, Result};
use folio_content::{ContentSource, HttpContentSource, PostQuery};
use folio_core::config::CONFIG_FILE;
use folio_core::{SiteConfig, TranslationTable, parse_site_toml};
use folio_generator::{GenerationReport, InjectionReport, generate_post_pages, inject_dir};
use std::path::{Path, PathBuf};

/// What each build step did. A step that failed carries its error message
/// and the later steps still run.
#[derive(Debug)]
pub struct BuildSummary {
    pub posts: Result<GenerationReport, String>,
    pub injection: Result<InjectionReport, String>,
}

/// Post-process the bundled site in the output directory.
///
/// Generates one page per post from the bundled blog template, then
/// injects default-language text into every HTML file. Neither step
/// failing stops the other; with `strict` any failure fails the command.
pub async fn run(path: PathBuf, strict: bool) -> Result<()> {
    println!("🔨 Building site...");
    println!("   Source: {}", path.display());

    let config = parse_site_toml(path.join(CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;
    log::debug!("[build] Content API: {}", config.api.base_url);

    let output = config.output_dir(&path);
    if !output.is_dir() {
        anyhow::bail!(
            "Output directory {} does not exist\nBundle the site first, then run 'folio build {}'",
            output.display(),
            path.display()
        );
    }
    println!("   Output: {}", output.display());
    println!();

    let source = HttpContentSource::new(&config.api.base_url)?;
    let summary = build_site(&path, &config, &source).await;

    println!();
    match &summary.posts {
        Ok(report) => println!("✅ Generated {} post pages", report.written.len()),
        Err(e) => eprintln!("⚠️  Post pages skipped: {}", e),
    }
    if let Ok(report) = &summary.injection {
        println!(
            "✅ Injected {} translations into {} of {} HTML files",
            report.injections, report.files_changed, report.files_scanned
        );
    }

    if strict {
        summary.check()?;
    }

    Ok(())
}

impl BuildSummary {
    /// Fail on any step error or any post that did not generate
    pub fn check(&self) -> Result<()> {
        match &self.posts {
            Err(e) => anyhow::bail!("Post page generation failed: {}", e),
            Ok(report) if !report.is_clean() => {
                let slugs: Vec<&str> = report.failed.iter().map(|f| f.slug.as_str()).collect();
                anyhow::bail!(
                    "{} post page(s) failed to generate: {}",
                    slugs.len(),
                    slugs.join(", ")
                );
            }
            Ok(_) => {}
        }
        if let Err(e) = &self.injection {
            anyhow::bail!("Content injection failed: {}", e);
        }
        Ok(())
    }
}

pub(crate) async fn build_site<S>(root: &Path, config: &SiteConfig, source: &S) -> BuildSummary
where
    S: ContentSource + ?Sized,
{
    let posts = generate_posts(root, config, source).await;
    let injection = inject_translations(root, config);
    BuildSummary { posts, injection }
}

async fn generate_posts<S>(
    root: &Path,
    config: &SiteConfig,
    source: &S,
) -> Result<GenerationReport, String>
where
    S: ContentSource + ?Sized,
{
    println!("📰 Fetching posts...");
    let posts = match source.list_posts(&PostQuery::with_content()).await {
        Ok(posts) => posts,
        Err(e) => {
            eprintln!("   ⚠ Could not fetch posts: {}", e);
            return Err(e.to_string());
        }
    };
    println!("   ✓ {} posts", posts.len());

    println!("📝 Generating post pages...");
    let report = generate_post_pages(
        &posts,
        &config.template_path(root),
        &config.posts_dir(root),
        config,
    )
    .map_err(|e| {
        eprintln!("   ⚠ {:#}", e);
        format!("{:#}", e)
    })?;

    for failure in &report.failed {
        eprintln!("   ⚠ {}: {}", failure.slug, failure.error);
    }
    println!("   ✓ Wrote {} files", report.written.len());

    Ok(report)
}

fn inject_translations(root: &Path, config: &SiteConfig) -> Result<InjectionReport, String> {
    println!("🌐 Injecting default-language content...");
    let translations = config.translations_path(root);
    let result = TranslationTable::from_file(&translations)
        .with_context(|| format!("Failed to load translations {}", translations.display()))
        .and_then(|table| inject_dir(&config.output_dir(root), &table));

    match result {
        Ok(report) => {
            println!("   ✓ Updated {} files", report.files_changed);
            Ok(report)
        }
        Err(e) => {
            eprintln!("   ⚠ {:#}", e);
            Err(format!("{:#}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use folio_core::{Error, Post, parse_site_toml_str};
    use std::fs;
    use tempfile::TempDir;

    const SITE: &str = r#"
[site]
base_url = "https://example.com"
author = "Sam"

[api]
base_url = "https://api.example.com/exec"
"#;

    const TEMPLATE: &str = r#"<html><head><title data-i18n="blog.title">Blog</title><meta name="description" content=""></head><body><div id="post-content"></div></body></html>"#;

    struct FakeSource {
        posts: Option<Vec<Post>>,
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn list_posts(&self, query: &PostQuery) -> folio_core::Result<Vec<Post>> {
            assert_eq!(query.content, Some(true));
            self.posts
                .clone()
                .ok_or_else(|| Error::Http("connection refused".to_string()))
        }

        async fn post_by_slug(&self, _slug: &str) -> folio_core::Result<Post> {
            Err(Error::Api("Post not found".to_string()))
        }

        async fn post_by_id(&self, _id: &str) -> folio_core::Result<Post> {
            Err(Error::Api("Post not found".to_string()))
        }
    }

    fn post(slug: &str) -> Post {
        serde_json::from_value(serde_json::json!({
            "slug": slug,
            "title": "Hello",
            "excerpt": "An excerpt",
            "content": "<p>Body</p>",
            "lang": "en",
            "updatedAt": "2024-01-02T00:00:00Z"
        }))
        .unwrap()
    }

    /// A bundled site: template, one page needing injection and translations
    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let config = parse_site_toml_str(SITE).unwrap();

        let output = config.output_dir(dir.path());
        fs::create_dir_all(&output).unwrap();
        fs::write(config.template_path(dir.path()), TEMPLATE).unwrap();
        fs::write(
            output.join("index.html"),
            r#"<html><body><h1 data-i18n="hero.title"></h1></body></html>"#,
        )
        .unwrap();

        let translations = config.translations_path(dir.path());
        fs::create_dir_all(translations.parent().unwrap()).unwrap();
        fs::write(&translations, r#"{"hero": {"title": "Hi, I'm Sam"}}"#).unwrap();

        (dir, config)
    }

    #[tokio::test]
    async fn test_build_generates_and_injects() {
        let (dir, config) = site();
        let source = FakeSource {
            posts: Some(vec![post("hello"), post("second")]),
        };

        let summary = build_site(dir.path(), &config, &source).await;

        assert_eq!(summary.posts.as_ref().unwrap().written.len(), 2);
        assert!(config.posts_dir(dir.path()).join("post-hello.html").exists());

        let index = fs::read_to_string(config.output_dir(dir.path()).join("index.html")).unwrap();
        assert!(index.contains("<h1 data-i18n=\"hero.title\">Hi, I&#x27;m Sam</h1>"));
        assert!(summary.check().is_ok());
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_generation_but_injects() {
        let (dir, config) = site();
        let source = FakeSource { posts: None };

        let summary = build_site(dir.path(), &config, &source).await;

        assert!(summary.posts.as_ref().unwrap_err().contains("connection refused"));
        assert!(!config.posts_dir(dir.path()).exists());
        assert_eq!(summary.injection.as_ref().unwrap().files_changed, 1);
        assert!(summary.check().is_err());
    }

    #[tokio::test]
    async fn test_failed_post_is_reported_by_check() {
        let (dir, config) = site();
        let source = FakeSource {
            posts: Some(vec![post("good"), post("../escape")]),
        };

        let summary = build_site(dir.path(), &config, &source).await;
        let report = summary.posts.as_ref().unwrap();

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.failed[0].slug, "../escape");
        let err = summary.check().unwrap_err().to_string();
        assert!(err.contains("1 post page(s) failed"));
    }

    #[tokio::test]
    async fn test_missing_translations_reported() {
        let (dir, config) = site();
        fs::remove_file(config.translations_path(dir.path())).unwrap();
        let source = FakeSource { posts: Some(vec![]) };

        let summary = build_site(dir.path(), &config, &source).await;

        assert!(summary.posts.is_ok());
        assert!(summary.injection.unwrap_err().contains("Failed to load translations"));
    }

    #[tokio::test]
    async fn test_run_requires_bundled_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), SITE).unwrap();

        let err = run(dir.path().to_path_buf(), false).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
