// Which post a single-post page is showing

use url::Url;

const BLOG_PREFIX: &str = "/blog/";

/// Slug from a `/blog/{slug}` path, else from the `slug` query parameter.
///
/// Generated file names (`/blog/post-{slug}.html`) resolve to the bare slug.
pub fn resolve_slug(path: &str, query: &str) -> Option<String> {
    slug_from_path(path).or_else(|| slug_from_query(query))
}

/// Same as [`resolve_slug`] for a full page URL
pub fn resolve_slug_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    resolve_slug(url.path(), url.query().unwrap_or_default())
}

fn slug_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix(BLOG_PREFIX)?.trim_end_matches('/');
    if rest.is_empty() || rest.contains('/') {
        return None;
    }

    let decoded = urlencoding::decode(rest).ok()?.into_owned();
    let slug = match decoded
        .strip_suffix(".html")
        .and_then(|name| name.strip_prefix("post-"))
    {
        Some(inner) => inner.to_string(),
        None => decoded,
    };

    (!slug.is_empty()).then_some(slug)
}

fn slug_from_query(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(key, _)| key == "slug")
        .map(|(_, value)| value.into_owned())
        .filter(|slug| !slug.is_empty())
}
