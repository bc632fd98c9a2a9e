// HTML fragments for the blog list and post views

use chrono::{DateTime, Datelike, NaiveDate};
use folio_core::text::html_escape;
use folio_core::{Language, OriginalSource, Post};
use url::Url;

const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const AR_MONTHS: [&str; 12] = [
    "يناير", "فبراير", "مارس", "أبريل", "مايو", "يونيو", "يوليو", "أغسطس", "سبتمبر",
    "أكتوبر", "نوفمبر", "ديسمبر",
];

/// Link to a post page from the list
pub fn post_link(slug: &str) -> String {
    format!("/blog.html?slug={}", urlencoding::encode(slug))
}

/// Long-form date (`January 2, 2024` / `٢ يناير ٢٠٢٤`).
///
/// Unparseable input is returned unchanged.
pub fn format_date(value: &str, language: Language) -> String {
    let value = value.trim();
    let date = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"));

    let Ok(date) = date else {
        return value.to_string();
    };

    let month = date.month0() as usize;
    match language {
        Language::En => format!("{} {}, {}", EN_MONTHS[month], date.day(), date.year()),
        Language::Ar => format!(
            "{} {} {}",
            arabic_digits(&date.day().to_string()),
            AR_MONTHS[month],
            arabic_digits(&date.year().to_string())
        ),
    }
}

fn arabic_digits(ascii: &str) -> String {
    ascii
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32(0x0660 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

/// Host name shown for an originally-published link
pub fn source_host(source: &OriginalSource) -> Option<String> {
    Url::parse(&source.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}

fn tag_spans(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!(r#"<span class="post-tag">#{}</span>"#, html_escape(tag)))
        .collect()
}

/// One card in the list grid
pub fn post_card(post: &Post, language: Language) -> String {
    let original = post
        .original_source
        .as_ref()
        .and_then(|source| {
            let host = source_host(source)?;
            Some(format!(
                r#"<div class="original-source"><span class="original-badge" data-i18n="blog.originallyPublished">Originally published</span><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></div>"#,
                html_escape(&source.url),
                html_escape(&host)
            ))
        })
        .unwrap_or_default();

    format!(
        r#"<article class="blog-card" dir="{dir}"><div class="blog-card-header"><h3 class="blog-card-title"><a href="{link}">{title}</a></h3><span class="blog-card-lang">{lang}</span></div><p class="blog-card-excerpt">{excerpt}</p>{original}<div class="blog-card-footer"><div class="blog-card-tags">{tags}</div><time class="blog-card-date" datetime="{published}">{date}</time></div></article>"#,
        dir = post.language.direction(),
        link = html_escape(&post_link(&post.slug)),
        title = html_escape(&post.title),
        lang = post.language.code().to_uppercase(),
        excerpt = html_escape(&post.excerpt),
        original = original,
        tags = tag_spans(&post.tags),
        published = html_escape(&post.published_at),
        date = html_escape(&format_date(&post.published_at, language)),
    )
}

/// The full post article. The body is trusted HTML from the content API.
pub fn post_article(post: &Post, language: Language) -> String {
    let dir = post.language.direction();

    let excerpt = if post.excerpt.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="post-excerpt">{}</p>"#, html_escape(&post.excerpt))
    };

    let tags = if post.tags.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="post-tags">{}</div>"#, tag_spans(&post.tags))
    };

    let original = post
        .original_source
        .as_ref()
        .and_then(|source| {
            let host = source_host(source)?;
            let date = source
                .date
                .as_deref()
                .map(|d| format_date(d, language))
                .unwrap_or_default();
            Some(format!(
                r#"<div class="original-source-banner"><p><span data-i18n="blog.originallyPublishedOn">Originally published on</span> <a href="{}" target="_blank" rel="noopener noreferrer">{}</a> <span data-i18n="blog.on">on</span> {}</p></div>"#,
                html_escape(&source.url),
                html_escape(&host),
                html_escape(&date)
            ))
        })
        .unwrap_or_default();

    format!(
        r#"<header class="post-header" dir="{dir}"><div class="post-meta"><span class="post-lang-badge">{lang}</span><time class="post-date" datetime="{published}">{published_date}</time></div><h1 class="post-title">{title}</h1>{excerpt}{tags}{original}</header><div class="post-content" dir="{dir}">{content}</div><footer class="post-footer"><div class="post-updated"><span data-i18n="blog.lastUpdated">Last updated:</span> <time datetime="{updated}">{updated_date}</time></div><a href="/#blog" class="btn-secondary" data-i18n="blog.backToBlog">Back to Blog</a></footer>"#,
        dir = dir,
        lang = post.language.code().to_uppercase(),
        published = html_escape(&post.published_at),
        published_date = html_escape(&format_date(&post.published_at, language)),
        title = html_escape(&post.title),
        excerpt = excerpt,
        tags = tags,
        original = original,
        content = post.content.as_deref().unwrap_or_default(),
        updated = html_escape(post.version()),
        updated_date = html_escape(&format_date(post.version(), language)),
    )
}

/// Tag filter buttons, marking the active one
pub fn tag_buttons<'a>(tags: impl IntoIterator<Item = &'a str>, active: Option<&str>) -> String {
    tags.into_iter()
        .map(|tag| {
            let class = if active == Some(tag) {
                "tag-btn active"
            } else {
                "tag-btn"
            };
            let escaped = html_escape(tag);
            format!(
                r#"<button class="{}" data-tag="{}">#{}</button>"#,
                class, escaped, escaped
            )
        })
        .collect()
}
