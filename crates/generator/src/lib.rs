// Build-time HTML generation: per-post pages and default-language injection

pub mod html;
pub mod page;
pub mod seo;

use anyhow::{Context, Result};
use folio_core::{Post, SiteConfig};
use std::fs;
use std::path::{Path, PathBuf};

pub use page::{post_file_name, post_url, render_post_page, truncate_description};
pub use seo::{InjectionReport, inject_dir, inject_file, inject_html};

/// A post that could not be generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFailure {
    pub slug: String,
    pub error: String,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<PostFailure>,
}

impl GenerationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write `post-{slug}.html` into `posts_dir` for every post.
///
/// An unreadable template or an uncreatable output directory aborts the
/// run. A post that fails to render or write is logged and recorded, and
/// the remaining posts are still processed.
pub fn generate_post_pages(
    posts: &[Post],
    template_path: &Path,
    posts_dir: &Path,
    config: &SiteConfig,
) -> Result<GenerationReport> {
    let template = fs::read_to_string(template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;
    fs::create_dir_all(posts_dir)
        .with_context(|| format!("Failed to create {}", posts_dir.display()))?;

    log::info!("[generator] Generating {} post pages", posts.len());

    let mut report = GenerationReport::default();
    for post in posts {
        match write_post_page(&template, post, posts_dir, config) {
            Ok(path) => {
                log::debug!("[generator] Wrote {}", path.display());
                report.written.push(path);
            }
            Err(e) => {
                log::error!("[generator] Failed to generate '{}': {:#}", post.slug, e);
                report.failed.push(PostFailure {
                    slug: post.slug.clone(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    Ok(report)
}

fn write_post_page(template: &str, post: &Post, posts_dir: &Path, config: &SiteConfig) -> Result<PathBuf> {
    let file_name = post_file_name(&post.slug)?;
    let html = render_post_page(template, post, config)?;
    let path = posts_dir.join(file_name);
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
