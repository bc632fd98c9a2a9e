//! Single-post view.
//!
//! A page generated at build time carries the post as embedded JSON and
//! renders it without a round trip. A background check then compares the
//! embedded version marker with the live API and re-renders only when the
//! live copy is strictly newer.

use folio_content::ContentSource;
use folio_core::{Language, Post, Version};

use crate::page::{BlogPage, Region};
use crate::render;

const POST_DATA_MARKER: &str = r#"class="post-data""#;
const JSON_SCRIPT_OPEN: &str = r#"<script type="application/json">"#;
const VERSION_META: &str = r#"name="post-version" content=""#;

/// Post payload embedded in a generated page
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedData {
    pub post: Post,
    pub version: String,
}

impl EmbeddedData {
    /// Parse the embedded script text. Malformed data counts as absent.
    ///
    /// The version marker falls back to the post's own `updatedAt`.
    pub fn parse(json: &str, version_marker: Option<&str>) -> Option<Self> {
        let post: Post = match serde_json::from_str(json) {
            Ok(post) => post,
            Err(e) => {
                log::warn!("[client] Ignoring malformed embedded post data: {}", e);
                return None;
            }
        };

        let version = version_marker
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| post.version())
            .to_string();
        Some(Self { post, version })
    }

    /// Extract the payload and version marker from a generated page
    pub fn from_html(html: &str) -> Option<Self> {
        let data = html.find(POST_DATA_MARKER)?;
        let start = data + html[data..].find(JSON_SCRIPT_OPEN)? + JSON_SCRIPT_OPEN.len();
        let end = start + html[start..].find("</script>")?;

        let version = html.find(VERSION_META).and_then(|pos| {
            let value_start = pos + VERSION_META.len();
            let value_end = value_start + html[value_start..].find('"')?;
            Some(&html[value_start..value_end])
        });

        Self::parse(&html[start..end], version)
    }
}

/// Where the displayed post came from
#[derive(Debug, Clone, PartialEq)]
pub enum PostSource {
    PreRendered { post: Post, version: String },
    Fetched(Post),
}

impl PostSource {
    pub fn post(&self) -> &Post {
        match self {
            PostSource::PreRendered { post, .. } | PostSource::Fetched(post) => post,
        }
    }
}

/// Outcome of the background version check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Live-fetched posts are already current
    Skipped,
    Current,
    Refreshed,
    Failed(String),
}

pub struct PostView<S, P> {
    source: S,
    page: P,
    author: String,
    language: Language,
    slug: Option<String>,
    current: Option<PostSource>,
}

impl<S: ContentSource, P: BlogPage> PostView<S, P> {
    pub fn new(source: S, page: P, author: impl Into<String>) -> Self {
        Self {
            source,
            page,
            author: author.into(),
            language: Language::default(),
            slug: None,
            current: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn current(&self) -> Option<&PostSource> {
        self.current.as_ref()
    }

    /// Show the post for `slug`, preferring embedded data for it.
    ///
    /// Returns false when nothing could be shown; the error region is
    /// visible and [`retry`](Self::retry) fetches again.
    pub async fn init(&mut self, slug: Option<String>, embedded: Option<EmbeddedData>) -> bool {
        if let Some(data) = embedded {
            if slug.as_deref().is_none_or(|s| s == data.post.slug) {
                self.slug = Some(data.post.slug.clone());
                self.render(&data.post);
                self.current = Some(PostSource::PreRendered {
                    post: data.post,
                    version: data.version,
                });
                return true;
            }
            log::warn!(
                "[client] Embedded post '{}' does not match the requested page",
                data.post.slug
            );
        }

        self.slug = slug;
        self.load().await
    }

    pub async fn retry(&mut self) -> bool {
        self.load().await
    }

    async fn load(&mut self) -> bool {
        let Some(slug) = self.slug.clone() else {
            log::warn!("[client] No post slug in the page address");
            self.show_error();
            return false;
        };

        self.page.set_visible(Region::PostLoading, true);
        self.page.set_visible(Region::PostError, false);

        match self.source.post_by_slug(&slug).await {
            Ok(post) => {
                self.render(&post);
                self.current = Some(PostSource::Fetched(post));
                true
            }
            Err(e) => {
                log::error!("[client] Failed to load post '{}': {}", slug, e);
                self.show_error();
                false
            }
        }
    }

    /// Compare the embedded version with the live API and re-render when
    /// the live post is strictly newer.
    pub async fn check_freshness(&mut self) -> Freshness {
        let (slug, embedded_version) = match &self.current {
            Some(PostSource::PreRendered { post, version }) => (post.slug.clone(), version.clone()),
            Some(PostSource::Fetched(_)) | None => return Freshness::Skipped,
        };

        let live = match self.source.post_by_slug(&slug).await {
            Ok(post) => post,
            Err(e) => {
                log::warn!("[client] Freshness check for '{}' failed: {}", slug, e);
                return Freshness::Failed(e.to_string());
            }
        };

        if !Version(live.version()).is_newer_than(&Version(&embedded_version)) {
            return Freshness::Current;
        }

        log::info!(
            "[client] Post '{}' updated ({} -> {}), re-rendering",
            slug,
            embedded_version,
            live.version()
        );
        self.render(&live);
        self.current = Some(PostSource::Fetched(live));
        Freshness::Refreshed
    }

    /// Re-render dates for a new UI language
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if let Some(post) = self.current.as_ref().map(|c| c.post().clone()) {
            self.render(&post);
        }
    }

    fn render(&mut self, post: &Post) {
        let html = render::post_article(post, self.language);
        self.page.set_html(Region::PostContent, &html);
        self.page
            .set_document_title(&format!("{} - {}", post.title, self.author));
        self.page.set_direction(post.language.direction());
        if !post.excerpt.is_empty() {
            self.page.set_meta_description(&post.excerpt);
        }
        self.page.set_visible(Region::PostLoading, false);
        self.page.set_visible(Region::PostError, false);
        self.page.set_visible(Region::PostContent, true);
    }

    fn show_error(&mut self) {
        self.page.set_visible(Region::PostLoading, false);
        self.page.set_visible(Region::PostContent, false);
        self.page.set_visible(Region::PostError, true);
    }
}
