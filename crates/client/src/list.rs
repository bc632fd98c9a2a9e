//! Blog list view: language and tag filters over a growing page window.

use folio_content::{ContentSource, PostQuery};
use folio_core::{Language, Post};

use crate::page::{BlogPage, Region};
use crate::render;

pub const POSTS_PER_PAGE: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LanguageFilter {
    #[default]
    All,
    Only(Language),
}

impl LanguageFilter {
    /// `all`, `en` or `ar` (the filter buttons' `data-filter` values)
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim() {
            "all" => Some(LanguageFilter::All),
            code => Language::from_code(code).map(LanguageFilter::Only),
        }
    }

    pub fn matches(self, post: &Post) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Only(language) => post.language == language,
        }
    }
}

/// Posts plus filter and paging state
#[derive(Debug, Clone)]
pub struct BlogList {
    posts: Vec<Post>,
    filter: LanguageFilter,
    tag: Option<String>,
    page: usize,
    page_size: usize,
}

impl Default for BlogList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl BlogList {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            filter: LanguageFilter::All,
            tag: None,
            page: 0,
            page_size: POSTS_PER_PAGE,
        }
    }

    /// Replace the posts and go back to the first page
    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.page = 0;
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn filter(&self) -> LanguageFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: LanguageFilter) {
        self.filter = filter;
        self.page = 0;
    }

    pub fn active_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Activate `tag`, or clear it when it is already active
    pub fn toggle_tag(&mut self, tag: &str) {
        if self.tag.as_deref() == Some(tag) {
            self.tag = None;
        } else {
            self.tag = Some(tag.to_string());
        }
        self.page = 0;
    }

    pub fn load_more(&mut self) {
        self.page += 1;
    }

    /// Posts matching the language filter and the active tag
    pub fn filtered(&self) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|post| self.filter.matches(post))
            .filter(|post| self.tag.as_deref().is_none_or(|tag| post.has_tag(tag)))
            .collect()
    }

    /// Every page up to and including the current one
    pub fn visible(&self) -> Vec<&Post> {
        let end = self.window_end();
        self.filtered().into_iter().take(end).collect()
    }

    pub fn has_more(&self) -> bool {
        self.window_end() < self.filtered().len()
    }

    fn window_end(&self) -> usize {
        (self.page + 1) * self.page_size
    }

    /// Unique tags in first-seen order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for tag in self.posts.iter().flat_map(|post| post.tags.iter()) {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag);
            }
        }
        tags
    }
}

/// List view bound to a content source and a page
pub struct BlogListView<S, P> {
    source: S,
    page: P,
    list: BlogList,
    language: Language,
}

impl<S: ContentSource, P: BlogPage> BlogListView<S, P> {
    pub fn new(source: S, page: P) -> Self {
        Self {
            source,
            page,
            list: BlogList::default(),
            language: Language::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn list(&self) -> &BlogList {
        &self.list
    }

    /// Fetch post summaries and render. A failure shows the error region
    /// and is left for the reader to retry.
    pub async fn load(&mut self) -> bool {
        self.page.set_visible(Region::ListLoading, true);
        self.page.set_visible(Region::ListError, false);

        match self.source.list_posts(&PostQuery::without_content()).await {
            Ok(posts) => {
                log::debug!("[client] Loaded {} posts", posts.len());
                self.list.set_posts(posts);
                self.render();
                self.render_tags();
                self.page.set_visible(Region::ListLoading, false);
                true
            }
            Err(e) => {
                log::error!("[client] Failed to load posts: {}", e);
                self.page.set_visible(Region::ListLoading, false);
                self.page.set_visible(Region::ListError, true);
                false
            }
        }
    }

    pub async fn retry(&mut self) -> bool {
        self.load().await
    }

    pub fn apply_filter(&mut self, filter: LanguageFilter) {
        self.list.set_filter(filter);
        self.render();
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.list.toggle_tag(tag);
        self.render();
        self.render_tags();
    }

    pub fn load_more(&mut self) {
        self.list.load_more();
        self.render();
    }

    /// Re-render dates for a new UI language
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.render();
    }

    fn render(&mut self) {
        let visible = self.list.visible();
        if visible.is_empty() {
            self.page.set_html(Region::PostsGrid, "");
            self.page.set_visible(Region::NoPosts, true);
            self.page.set_visible(Region::LoadMore, false);
            return;
        }

        let cards: String = visible
            .iter()
            .map(|post| render::post_card(post, self.language))
            .collect();
        let has_more = self.list.has_more();

        self.page.set_visible(Region::NoPosts, false);
        self.page.set_html(Region::PostsGrid, &cards);
        self.page.set_visible(Region::LoadMore, has_more);
    }

    fn render_tags(&mut self) {
        let tags = self.list.tags();
        if tags.is_empty() {
            return;
        }
        let html = render::tag_buttons(tags, self.list.active_tag());
        self.page.set_html(Region::TagList, &html);
    }
}
