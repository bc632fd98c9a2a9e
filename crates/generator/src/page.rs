// Per-post page: template meta rewrite plus embedded post payload

use anyhow::{Result, bail};
use folio_core::SiteConfig;
use folio_core::text::{html_escape, script_safe_json};
use folio_core::types::Post;
use quick_xml::events::{BytesStart, Event};

use crate::html::{
    attr_value, create_html_reader, create_html_writer, into_string, rewrite_attrs, tag_name,
    write_element_raw, write_empty_elem, HtmlWriter,
};

pub const MAX_DESCRIPTION_CHARS: usize = 160;
const ELLIPSIS: &str = "...";
const SHARE_IMAGE_SIZE: u32 = 1200;
const VERSION_META: &str = "post-version";
const UNTITLED: &str = "Untitled Post";

/// Truncate to at most 160 characters, marking the cut with `...`
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return text.to_string();
    }
    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Output file name for a post, rejecting slugs that would escape the posts directory
pub fn post_file_name(slug: &str) -> Result<String> {
    if slug.trim().is_empty() {
        bail!("Post has an empty slug");
    }
    if slug == "." || slug == ".." || slug.contains(['/', '\\', '\0']) {
        bail!("Slug is not safe as a file name: '{}'", slug);
    }
    Ok(format!("post-{}.html", slug))
}

/// Canonical post URL: `{base}/blog/{slug}`
pub fn post_url(base_url: &str, slug: &str) -> String {
    format!("{}/blog/{}", base_url, urlencoding::encode(slug))
}

/// Resolve a site-relative path against the base URL; absolute URLs pass through.
pub fn absolute_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let encoded: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base_url, encoded.join("/"))
}

/// Share image: configured local copy, then the remote image, then the default avatar
pub fn share_image_url(post: &Post, config: &SiteConfig) -> String {
    let base = &config.site.base_url;
    if let Some(local) = config.local_image_path(&post.slug) {
        return absolute_url(base, &local);
    }
    if let Some(remote) = post
        .image
        .as_ref()
        .and_then(|image| image.remote_url(SHARE_IMAGE_SIZE))
    {
        return remote;
    }
    absolute_url(base, &config.site.default_image)
}

/// Escaped values written into the template
struct PageMeta {
    title: String,
    description: String,
    keywords: String,
    url: String,
    image: String,
    locale: &'static str,
    locale_alternate: &'static str,
    version: String,
    slug: String,
    dir: &'static str,
    payload: String,
}

impl PageMeta {
    fn new(post: &Post, config: &SiteConfig) -> Result<Self> {
        let title = if post.title.trim().is_empty() {
            UNTITLED
        } else {
            post.title.as_str()
        };
        let page_title = format!("{} - {}", config.site.author, title);

        let keywords: Vec<&str> = std::iter::once(config.site.author.as_str())
            .chain(config.site.keywords.iter().map(String::as_str))
            .chain(std::iter::once(title))
            .filter(|k| !k.is_empty())
            .collect();

        let payload = serde_json::to_string(post)?;

        Ok(Self {
            title: html_escape(&page_title),
            description: html_escape(&truncate_description(post.description_source())),
            keywords: html_escape(&keywords.join(", ")),
            url: html_escape(&post_url(&config.site.base_url, &post.slug)),
            image: html_escape(&share_image_url(post, config)),
            locale: post.language.og_locale(),
            locale_alternate: post.language.og_locale_alternate(),
            version: html_escape(post.version()),
            slug: html_escape(&post.slug),
            dir: post.language.direction(),
            payload: script_safe_json(&payload),
        })
    }

    /// New `content` for a `<meta>` identified by its name/property, if it is one we own
    fn meta_content(&self, key: &str) -> Option<&str> {
        let value = match key {
            "description" | "og:description" | "twitter:description" => self.description.as_str(),
            "keywords" => self.keywords.as_str(),
            "og:title" | "twitter:title" => self.title.as_str(),
            "og:url" | "twitter:url" => self.url.as_str(),
            "og:image" | "twitter:image" => self.image.as_str(),
            "locale" | "og:locale" => self.locale,
            "locale:alternate" | "og:locale:alternate" => self.locale_alternate,
            _ => return None,
        };
        Some(value)
    }
}

/// Render one post page from the template.
///
/// Elements the template does not contain are skipped silently.
pub fn render_post_page(template: &str, post: &Post, config: &SiteConfig) -> Result<String> {
    let meta = PageMeta::new(post, config)?;
    let content = template.as_bytes();
    let mut reader = create_html_reader(content);
    let mut writer = create_html_writer(content.len() + meta.payload.len() + 512);
    // Open `#blogPostContent`: its tag and how many same-named elements are open inside it
    let mut container: Option<(String, usize)> = None;
    let mut wrote_version = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => match tag_name(&elem).as_str() {
                "title" => {
                    reader.read_to_end(elem.name())?;
                    let start = rewrite_attrs(&elem, &[], &["data-i18n"]);
                    write_element_raw(&mut writer, start, meta.title.as_bytes())?;
                }
                "meta" | "link" => write_head_elem(&mut writer, elem, &meta, false)?,
                _ => {
                    let id = attr_value(&elem, "id");
                    match id.as_deref() {
                        Some("blogPostContent") if container.is_none() => {
                            container = Some((tag_name(&elem), 0));
                            writer.write_event(Event::Start(post_container(&elem, &meta)))?;
                        }
                        Some("postContent") if container.is_some() => {
                            let span = reader.read_to_end(elem.name())?;
                            let mut inner = content[span.start as usize..span.end as usize].to_vec();
                            inner.extend_from_slice(post_data_block(&meta).as_bytes());
                            write_element_raw(&mut writer, elem, &inner)?;
                        }
                        _ => {
                            if let Some((tag, depth)) = container.as_mut()
                                && tag_name(&elem) == *tag
                            {
                                *depth += 1;
                            }
                            writer.write_event(Event::Start(elem))?;
                        }
                    }
                }
            },
            Ok(Event::Empty(elem)) => match tag_name(&elem).as_str() {
                "meta" | "link" => write_head_elem(&mut writer, elem, &meta, true)?,
                _ => match attr_value(&elem, "id").as_deref() {
                    Some("blogPostContent") => {
                        write_element_raw(&mut writer, post_container(&elem, &meta), b"")?;
                    }
                    Some("postContent") if container.is_some() => {
                        let start = rewrite_attrs(&elem, &[], &[]);
                        write_element_raw(&mut writer, start, post_data_block(&meta).as_bytes())?;
                    }
                    _ => writer.write_event(Event::Empty(elem))?,
                },
            },
            Ok(Event::End(elem)) if elem.name().as_ref().eq_ignore_ascii_case(b"head") => {
                write_empty_elem(
                    &mut writer,
                    "meta",
                    &[("name", VERSION_META), ("content", meta.version.as_str())],
                )?;
                wrote_version = true;
                writer.write_event(Event::End(elem))?;
            }
            Ok(Event::End(elem)) => {
                let closes_container = match container.as_mut() {
                    Some((tag, depth))
                        if elem.name().as_ref().eq_ignore_ascii_case(tag.as_bytes()) =>
                    {
                        if *depth == 0 {
                            true
                        } else {
                            *depth -= 1;
                            false
                        }
                    }
                    _ => false,
                };
                if closes_container {
                    container = None;
                }
                writer.write_event(Event::End(elem))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    if !wrote_version {
        log::warn!(
            "[generator] Template has no </head>; '{}' gets no {} marker",
            post.slug,
            VERSION_META
        );
    }

    into_string(writer)
}

/// `<meta>` / `<link>` handling; a stale version marker is dropped.
fn write_head_elem(
    writer: &mut HtmlWriter,
    elem: BytesStart<'_>,
    meta: &PageMeta,
    empty: bool,
) -> Result<()> {
    let rewritten = if tag_name(&elem) == "link" {
        match attr_value(&elem, "rel").as_deref() {
            Some("canonical") => Some(rewrite_attrs(&elem, &[("href", meta.url.as_str())], &[])),
            _ => None,
        }
    } else {
        let key = attr_value(&elem, "property").or_else(|| attr_value(&elem, "name"));
        match key.as_deref() {
            Some(VERSION_META) => return Ok(()),
            Some(key) => meta
                .meta_content(key)
                .map(|value| rewrite_attrs(&elem, &[("content", value)], &[])),
            None => None,
        }
    };

    match rewritten {
        Some(out) if empty => writer.write_event(Event::Empty(out))?,
        Some(out) => writer.write_event(Event::Start(out))?,
        None if empty => writer.write_event(Event::Empty(elem))?,
        None => writer.write_event(Event::Start(elem))?,
    }
    Ok(())
}

fn post_container(elem: &BytesStart<'_>, meta: &PageMeta) -> BytesStart<'static> {
    rewrite_attrs(
        elem,
        &[
            ("dir", meta.dir),
            ("data-post-slug", meta.slug.as_str()),
            ("data-post-version", meta.version.as_str()),
        ],
        &[],
    )
}

fn post_data_block(meta: &PageMeta) -> String {
    format!(
        r#"<div class="post-data" style="display: none;"><script type="application/json">{}</script></div>"#,
        meta.payload
    )
}
