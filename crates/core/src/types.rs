use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Site languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    /// Pick a language from a browser locale such as `ar-SA` or `en-US`
    pub fn from_browser_locale(locale: &str) -> Self {
        if locale.to_ascii_lowercase().starts_with("ar") {
            Language::Ar
        } else {
            Language::En
        }
    }

    /// Text direction attribute value
    pub fn direction(self) -> &'static str {
        match self {
            Language::En => "ltr",
            Language::Ar => "rtl",
        }
    }

    /// Open Graph locale
    pub fn og_locale(self) -> &'static str {
        match self {
            Language::En => "en_US",
            Language::Ar => "ar_SA",
        }
    }

    /// Open Graph alternate locale (the other site language)
    pub fn og_locale_alternate(self) -> &'static str {
        match self {
            Language::En => Language::Ar.og_locale(),
            Language::Ar => Language::En.og_locale(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A blog post as served by the content API.
///
/// Fields the site does not model are kept in `extra` so the embedded
/// copy in generated pages is the complete payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// HTML body, absent when fetched with `content=false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(rename = "lang", default, deserialize_with = "lenient_language")]
    pub language: Language,
    #[serde(default, deserialize_with = "nullable")]
    pub published_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub updated_at: String,
    /// Legacy timestamp used when `updatedAt` is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PostImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_source: Option<OriginalSource>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    /// Version marker: `updatedAt`, falling back to the legacy `date`
    pub fn version(&self) -> &str {
        if !self.updated_at.is_empty() {
            return &self.updated_at;
        }
        self.date.as_deref().unwrap_or_default()
    }

    /// Social description source: excerpt, then meta description
    pub fn description_source(&self) -> &str {
        if !self.excerpt.is_empty() {
            return &self.excerpt;
        }
        self.meta_description.as_deref().unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Post image reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PostImage {
    /// Remote URL for the image at the requested pixel size
    pub fn remote_url(&self, size: u32) -> Option<String> {
        match (&self.drive_id, &self.url) {
            (Some(id), _) if !id.is_empty() => Some(drive_thumbnail_url(id, size)),
            (_, Some(url)) if !url.is_empty() => Some(url.clone()),
            _ => None,
        }
    }
}

pub fn drive_thumbnail_url(drive_id: &str, size: u32) -> String {
    format!(
        "https://drive.google.com/thumbnail?id={}&sz=s{}",
        drive_id, size
    )
}

/// Where a post was first published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Content API response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub posts: Option<Vec<Post>>,
    #[serde(default)]
    pub post: Option<Post>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Version marker comparison.
///
/// RFC 3339 timestamps are compared as instants; anything else falls back
/// to string ordering, which matches ISO-8601 text of the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version<'a>(pub &'a str);

impl Version<'_> {
    fn instant(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.0.trim()).ok()
    }

    /// True only when `self` is strictly newer than `other`
    pub fn is_newer_than(&self, other: &Version<'_>) -> bool {
        match (self.instant(), other.instant()) {
            (Some(a), Some(b)) => a > b,
            _ => self.0.trim() > other.0.trim(),
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Blank cells and unknown codes read as the default language
fn lenient_language<'de, D>(deserializer: D) -> std::result::Result<Language, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(Language::from_code(&code).unwrap_or_else(|| {
        log::debug!("[types] unrecognized post language '{}', using en", code);
        Language::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_deserializes_api_shape() {
        let json = r#"{
            "id": 7,
            "slug": "hello-world",
            "title": "Hello",
            "excerpt": "First post",
            "content": "<p>Hi</p>",
            "tags": ["intro", "meta"],
            "lang": "ar",
            "publishedAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-02T00:00:00.000Z",
            "image": {"driveId": "abc"},
            "originalSource": {"url": "https://medium.com/x", "date": "2023-12-01"},
            "status": "published"
        }"#;

        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.language, Language::Ar);
        assert_eq!(post.tags, vec!["intro", "meta"]);
        assert_eq!(post.version(), "2024-01-02T00:00:00.000Z");
        assert_eq!(post.extra.get("id"), Some(&serde_json::json!(7)));
        assert_eq!(post.extra.get("status"), Some(&serde_json::json!("published")));
    }

    #[test]
    fn test_post_tolerates_nulls() {
        let json = r#"{"slug": "s", "title": null, "tags": null, "lang": null}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.title, "");
        assert!(post.tags.is_empty());
        assert_eq!(post.language, Language::En);
    }

    #[test]
    fn test_blank_or_unknown_language_reads_as_english() {
        let json = r#"{
            "success": true,
            "posts": [
                {"slug": "good", "lang": "ar"},
                {"slug": "blank-lang", "lang": ""},
                {"slug": "odd-lang", "lang": "fr"},
                {"slug": "upper-lang", "lang": "AR"}
            ]
        }"#;

        let response: ApiResponse = serde_json::from_str(json).unwrap();
        let languages: Vec<Language> = response
            .posts
            .unwrap()
            .iter()
            .map(|p| p.language)
            .collect();
        assert_eq!(
            languages,
            vec![Language::Ar, Language::En, Language::En, Language::Ar]
        );
    }

    #[test]
    fn test_post_serialization_keeps_unknown_fields() {
        let json = r#"{"slug": "s", "views": 12}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&post).unwrap();
        assert_eq!(back["views"], 12);
        assert_eq!(back["lang"], "en");
    }

    #[test]
    fn test_version_falls_back_to_date() {
        let json = r#"{"slug": "s", "date": "2023-05-05"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.version(), "2023-05-05");
    }

    #[test]
    fn test_description_source_prefers_excerpt() {
        let mut post: Post = serde_json::from_str(r#"{"slug": "s"}"#).unwrap();
        post.meta_description = Some("meta".to_string());
        assert_eq!(post.description_source(), "meta");
        post.excerpt = "excerpt".to_string();
        assert_eq!(post.description_source(), "excerpt");
    }

    #[test]
    fn test_version_is_newer_than() {
        let old = Version("2024-01-01T00:00:00Z");
        let new = Version("2024-01-02T00:00:00Z");
        assert!(new.is_newer_than(&old));
        assert!(!old.is_newer_than(&new));
        assert!(!old.is_newer_than(&old));
    }

    #[test]
    fn test_version_compares_instants_across_offsets() {
        let utc = Version("2024-01-01T10:00:00Z");
        let plus_two = Version("2024-01-01T11:00:00+02:00");
        // 11:00+02:00 is 09:00Z
        assert!(utc.is_newer_than(&plus_two));
    }

    #[test]
    fn test_version_same_instant_different_precision_is_not_newer() {
        let a = Version("2024-01-01T00:00:00.000Z");
        let b = Version("2024-01-01T00:00:00Z");
        assert!(!a.is_newer_than(&b));
        assert!(!b.is_newer_than(&a));
    }

    #[test]
    fn test_image_remote_url() {
        let drive = PostImage {
            drive_id: Some("abc".to_string()),
            url: Some("https://x/y.png".to_string()),
        };
        assert_eq!(
            drive.remote_url(400).as_deref(),
            Some("https://drive.google.com/thumbnail?id=abc&sz=s400")
        );

        let plain = PostImage {
            drive_id: None,
            url: Some("https://x/y.png".to_string()),
        };
        assert_eq!(plain.remote_url(400).as_deref(), Some("https://x/y.png"));

        let empty = PostImage {
            drive_id: Some(String::new()),
            url: None,
        };
        assert_eq!(empty.remote_url(400), None);
    }

    #[test]
    fn test_language_helpers() {
        assert_eq!(Language::from_code("AR"), Some(Language::Ar));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::from_browser_locale("ar-SA"), Language::Ar);
        assert_eq!(Language::from_browser_locale("en-GB"), Language::En);
        assert_eq!(Language::Ar.direction(), "rtl");
        assert_eq!(Language::En.og_locale_alternate(), "ar_SA");
    }

    #[test]
    fn test_api_response_failure_shape() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"success": false, "error": "Post not found"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Post not found"));
        assert!(resp.post.is_none());
    }
}
