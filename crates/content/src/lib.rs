// Remote collaborators: the spreadsheet-backed content API and the contact form endpoint

pub mod http;

pub use http::{HttpContactEndpoint, HttpContentSource};

use async_trait::async_trait;
use folio_core::{Language, Post, Result};

/// Filters for listing posts. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    pub content: Option<bool>,
    pub lang: Option<Language>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

impl PostQuery {
    /// Full posts including HTML bodies (build time)
    pub fn with_content() -> Self {
        Self {
            content: Some(true),
            ..Self::default()
        }
    }

    /// Post summaries only (list views)
    pub fn without_content() -> Self {
        Self {
            content: Some(false),
            ..Self::default()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(content) = self.content {
            params.push(("content", content.to_string()));
        }
        if let Some(lang) = self.lang {
            params.push(("lang", lang.code().to_string()));
        }
        if let Some(tag) = &self.tag {
            params.push(("tag", tag.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;
    async fn post_by_slug(&self, slug: &str) -> Result<Post>;
    async fn post_by_id(&self, id: &str) -> Result<Post>;
}

/// Contact form receiver; only HTTP-level completion matters.
#[async_trait]
pub trait ContactEndpoint: Send + Sync {
    async fn submit(&self, fields: &[(String, String)]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_only_set_fields() {
        assert!(PostQuery::default().params().is_empty());
        assert_eq!(
            PostQuery::without_content().params(),
            vec![("content", "false".to_string())]
        );
    }

    #[test]
    fn test_query_params_all_fields() {
        let query = PostQuery {
            content: Some(true),
            lang: Some(Language::Ar),
            tag: Some("rust".to_string()),
            limit: Some(5),
        };

        assert_eq!(
            query.params(),
            vec![
                ("content", "true".to_string()),
                ("lang", "ar".to_string()),
                ("tag", "rust".to_string()),
                ("limit", "5".to_string()),
            ]
        );
    }
}
