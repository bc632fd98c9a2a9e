//! The document seam for blog views.
//!
//! Views never touch a real DOM. They drive a [`BlogPage`], and a page
//! that lacks one of the regions simply ignores operations on it.

use std::collections::HashMap;

/// Named parts of the list and post pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    ListLoading,
    ListError,
    PostsGrid,
    NoPosts,
    LoadMore,
    TagList,
    PostLoading,
    PostError,
    PostContent,
}

impl Region {
    /// Element id in the site markup
    pub fn element_id(self) -> &'static str {
        match self {
            Region::ListLoading => "blogLoading",
            Region::ListError => "blogError",
            Region::PostsGrid => "blogPosts",
            Region::NoPosts => "noPosts",
            Region::LoadMore => "loadMoreContainer",
            Region::TagList => "tagsContainer",
            Region::PostLoading => "postLoading",
            Region::PostError => "postError",
            Region::PostContent => "postContent",
        }
    }
}

pub trait BlogPage {
    fn set_visible(&mut self, region: Region, visible: bool);
    fn set_html(&mut self, region: Region, html: &str);
    fn set_document_title(&mut self, title: &str);
    fn set_meta_description(&mut self, description: &str);
    /// Text direction of the document root
    fn set_direction(&mut self, dir: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionState {
    pub visible: bool,
    pub html: String,
    pub renders: usize,
}

/// In-memory page, used for headless rendering and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    regions: HashMap<Region, RegionState>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub direction: Option<String>,
}

impl MemoryPage {
    /// A page containing only the given regions
    pub fn with_regions(regions: &[Region]) -> Self {
        Self {
            regions: regions
                .iter()
                .map(|region| (*region, RegionState::default()))
                .collect(),
            ..Self::default()
        }
    }

    /// Every region of the blog list page
    pub fn list_page() -> Self {
        Self::with_regions(&[
            Region::ListLoading,
            Region::ListError,
            Region::PostsGrid,
            Region::NoPosts,
            Region::LoadMore,
            Region::TagList,
        ])
    }

    /// Every region of the single-post page
    pub fn post_page() -> Self {
        Self::with_regions(&[Region::PostLoading, Region::PostError, Region::PostContent])
    }

    pub fn region(&self, region: Region) -> Option<&RegionState> {
        self.regions.get(&region)
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.region(region).is_some_and(|r| r.visible)
    }

    pub fn html(&self, region: Region) -> &str {
        self.region(region).map(|r| r.html.as_str()).unwrap_or_default()
    }

    pub fn renders(&self, region: Region) -> usize {
        self.region(region).map(|r| r.renders).unwrap_or_default()
    }
}

impl BlogPage for MemoryPage {
    fn set_visible(&mut self, region: Region, visible: bool) {
        if let Some(state) = self.regions.get_mut(&region) {
            state.visible = visible;
        }
    }

    fn set_html(&mut self, region: Region, html: &str) {
        if let Some(state) = self.regions.get_mut(&region) {
            state.html = html.to_string();
            state.renders += 1;
        }
    }

    fn set_document_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn set_meta_description(&mut self, description: &str) {
        self.meta_description = Some(description.to_string());
    }

    fn set_direction(&mut self, dir: &str) {
        self.direction = Some(dir.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_regions_are_ignored() {
        let mut page = MemoryPage::with_regions(&[Region::PostsGrid]);
        page.set_visible(Region::NoPosts, true);
        page.set_html(Region::TagList, "<button>#rust</button>");

        assert!(page.region(Region::NoPosts).is_none());
        assert!(!page.is_visible(Region::NoPosts));
        assert_eq!(page.html(Region::TagList), "");
    }

    #[test]
    fn test_set_html_counts_renders() {
        let mut page = MemoryPage::post_page();
        page.set_html(Region::PostContent, "<h1>a</h1>");
        page.set_html(Region::PostContent, "<h1>b</h1>");

        assert_eq!(page.html(Region::PostContent), "<h1>b</h1>");
        assert_eq!(page.renders(Region::PostContent), 2);
    }

    #[test]
    fn test_element_ids() {
        assert_eq!(Region::PostContent.element_id(), "postContent");
        assert_eq!(Region::LoadMore.element_id(), "loadMoreContainer");
    }
}
