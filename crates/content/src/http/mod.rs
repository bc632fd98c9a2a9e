// HTTP implementations of the content source and contact endpoint

use crate::{ContactEndpoint, ContentSource, PostQuery};
use async_trait::async_trait;
use folio_core::{ApiResponse, Error, Post, Result};
use url::Url;

fn http_error(err: reqwest::Error) -> Error {
    Error::Http(err.to_string())
}

/// Content API client (`GET {base}?mode=api&...`)
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpContentSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::ConfigParse(format!("Invalid API URL '{}': {}", base_url, e)))?;
        Ok(Self { client, base_url })
    }

    pub fn build_url(&self, params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("mode", "api");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn request(&self, params: &[(&str, String)], default_error: &str) -> Result<ApiResponse> {
        let url = self.build_url(params);
        log::debug!("[content] GET {}", url);

        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("HTTP error! status: {}", status.as_u16())));
        }

        let body = response.text().await.map_err(http_error)?;
        let parsed: ApiResponse = serde_json::from_str(&body)?;
        check_success(parsed, default_error)
    }

    async fn single(&self, params: &[(&str, String)]) -> Result<Post> {
        let response = self.request(params, "Post not found").await?;
        response
            .post
            .ok_or_else(|| Error::Api("Post not found".to_string()))
    }

    /// Download raw bytes (post images)
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!(
                "Failed to download image: {}",
                status.as_u16()
            )));
        }
        let bytes = response.bytes().await.map_err(http_error)?;
        Ok(bytes.to_vec())
    }
}

/// Reject `success: false` envelopes, keeping the server's message when present.
fn check_success(response: ApiResponse, default_error: &str) -> Result<ApiResponse> {
    if response.success {
        return Ok(response);
    }
    let message = response
        .error
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| default_error.to_string());
    Err(Error::Api(message))
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let response = self
            .request(&query.params(), "Failed to fetch posts")
            .await?;
        Ok(response.posts.unwrap_or_default())
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Post> {
        self.single(&[("slug", slug.to_string())]).await
    }

    async fn post_by_id(&self, id: &str) -> Result<Post> {
        self.single(&[("id", id.to_string())]).await
    }
}

/// Form-encoded POST to the contact endpoint
#[derive(Debug, Clone)]
pub struct HttpContactEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpContactEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ContactEndpoint for HttpContactEndpoint {
    async fn submit(&self, fields: &[(String, String)]) -> Result<()> {
        self.client
            .post(&self.url)
            .form(fields)
            .send()
            .await
            .map_err(http_error)?;
        Ok(())
    }
}
