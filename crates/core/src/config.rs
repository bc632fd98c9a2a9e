use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "site.toml";

/// Complete site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site: SiteInfo,
    pub api: ApiConfig,
    pub build: BuildConfig,
    /// Post slug -> locally hosted image filename (under `build.images_dir`)
    pub images: BTreeMap<String, PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactConfig>,
}

/// Public identity of the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Absolute origin without trailing slash, e.g. `https://example.com`
    pub base_url: String,
    pub author: String,
    pub keywords: Vec<String>,
    /// Site-relative path or absolute URL of the fallback share image
    pub default_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

/// Build output layout, all paths relative to the site directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub output_dir: PathBuf,
    /// Post page template, relative to `output_dir`
    pub template: PathBuf,
    /// Generated post pages directory, relative to `output_dir`
    pub posts_dir: PathBuf,
    /// Default-language translation table
    pub translations: PathBuf,
    pub public_dir: PathBuf,
    /// Downloaded post images, relative to `public_dir`
    pub images_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    pub endpoint: String,
}

impl SiteConfig {
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.build.output_dir)
    }

    pub fn template_path(&self, root: &Path) -> PathBuf {
        self.output_dir(root).join(&self.build.template)
    }

    pub fn posts_dir(&self, root: &Path) -> PathBuf {
        self.output_dir(root).join(&self.build.posts_dir)
    }

    pub fn translations_path(&self, root: &Path) -> PathBuf {
        root.join(&self.build.translations)
    }

    pub fn images_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.build.public_dir).join(&self.build.images_dir)
    }

    /// Site-relative URL path of a mapped post image, if the slug has one
    pub fn local_image_path(&self, slug: &str) -> Option<String> {
        let filename = self.images.get(slug)?;
        let dir = self.build.images_dir.to_string_lossy().replace('\\', "/");
        let file = filename.to_string_lossy().replace('\\', "/");
        Some(format!("/{}/{}", dir.trim_matches('/'), file))
    }
}

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    api: ApiConfig,
    #[serde(default)]
    build: RawBuild,
    #[serde(default)]
    images: BTreeMap<String, String>,
    #[serde(default)]
    contact: Option<ContactConfig>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    base_url: String,
    author: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default = "default_image")]
    default_image: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawBuild {
    output_dir: String,
    template: String,
    posts_dir: String,
    translations: String,
    public_dir: String,
    images_dir: String,
}

impl Default for RawBuild {
    fn default() -> Self {
        Self {
            output_dir: "dist".to_string(),
            template: "blog.html".to_string(),
            posts_dir: "blog".to_string(),
            translations: "public/i18n/en.json".to_string(),
            public_dir: "public".to_string(),
            images_dir: "images/blog".to_string(),
        }
    }
}

fn default_image() -> String {
    "/profile/avatar.png".to_string()
}

/// Parse site.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let site = SiteInfo {
        base_url: validate_url(&raw.site.base_url, "site.base_url")?,
        author: raw.site.author,
        keywords: raw.site.keywords,
        default_image: raw.site.default_image,
    };

    let api = ApiConfig {
        base_url: validate_url(&raw.api.base_url, "api.base_url")?,
    };

    let build = BuildConfig {
        output_dir: validate_path(&raw.build.output_dir, "build.output_dir")?,
        template: validate_path(&raw.build.template, "build.template")?,
        posts_dir: validate_path(&raw.build.posts_dir, "build.posts_dir")?,
        translations: validate_path(&raw.build.translations, "build.translations")?,
        public_dir: validate_path(&raw.build.public_dir, "build.public_dir")?,
        images_dir: validate_path(&raw.build.images_dir, "build.images_dir")?,
    };

    let images = raw
        .images
        .into_iter()
        .map(|(slug, file)| {
            let path = validate_path(&file, &format!("images.{}", slug))?;
            Ok((slug, path))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let contact = match raw.contact {
        Some(c) => Some(ContactConfig {
            endpoint: validate_url(&c.endpoint, "contact.endpoint")?,
        }),
        None => None,
    };

    Ok(SiteConfig {
        site,
        api,
        build,
        images,
        contact,
    })
}

/// Validate an absolute http(s) URL and drop any trailing slash.
fn validate_url(value: &str, field_name: &str) -> Result<String> {
    let parsed = url::Url::parse(value.trim()).map_err(|e| {
        Error::ConfigParse(format!("Invalid URL in '{}': '{}' ({})", field_name, value, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::ConfigParse(format!(
            "URL in '{}' must use http or https: '{}'",
            field_name, value
        )));
    }

    Ok(value.trim().trim_end_matches('/').to_string())
}

/// Validate and convert a path string to PathBuf.
///
/// This function prevents path traversal by rejecting:
/// - Absolute paths (starting with `/` or Windows drive letters)
/// - Paths containing parent directory references (`..`)
///
/// # Examples
///
/// ```text
/// validate_path("dist", "build.output_dir")  → Ok(PathBuf)
/// validate_path("public/i18n/en.json", "build.translations")  → Ok(PathBuf)
///
/// validate_path("/etc/passwd", "build.template")  → Err("Absolute paths not allowed...")
/// validate_path("../../../etc/passwd", "images.x")  → Err("Parent directory references...")
/// ```
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}
