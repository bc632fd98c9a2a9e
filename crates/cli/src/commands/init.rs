use anyhow::{Context, Result};
use folio_core::config::{CONFIG_FILE, parse_site_toml_str};
use std::fs;
use std::path::{Path, PathBuf};

const TRANSLATIONS_DIR: &str = "public/i18n";

/// Escape a string for a TOML basic string.
///
/// The scaffold is written by hand to keep its comments, so values are
/// escaped here rather than serialized.
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\x08', "\\b")
        .replace('\x0C', "\\f")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Initialize a site directory.
///
/// Writes `site.toml` with the given values (placeholders otherwise) and,
/// when missing, empty-but-valid translation tables for both languages.
///
/// # Errors
///
/// Returns an error if the directory doesn't exist, `site.toml` already
/// exists, or a value makes the generated configuration invalid.
pub async fn run(
    path: PathBuf,
    author: Option<String>,
    base_url: Option<String>,
    api_url: Option<String>,
) -> Result<()> {
    println!("Initializing site directory: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Directory '{}' does not exist. Create it first: mkdir {}",
            path.display(),
            path.display()
        );
    }

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists at {}\nHint: Delete it first or use a different directory",
            CONFIG_FILE,
            config_path.display()
        );
    }

    generate_site_toml(
        &path,
        author.as_deref(),
        base_url.as_deref(),
        api_url.as_deref(),
    )?;
    println!("✓ Created {}", CONFIG_FILE);

    let created = generate_translation_stubs(&path)?;
    for file in &created {
        println!("✓ Created {}", file.display());
    }

    println!("\nNext steps:");
    println!("  1. Edit {} (author, base_url, api endpoint, image mappings)", CONFIG_FILE);
    println!("  2. Bundle the site into dist/ with your usual frontend build");
    println!("  3. Build post pages: folio build {}", path.display());

    Ok(())
}

fn generate_site_toml(
    base: &Path,
    author: Option<&str>,
    base_url: Option<&str>,
    api_url: Option<&str>,
) -> Result<()> {
    let author_name = toml_escape_string(author.unwrap_or("Your Name"));
    let site_url = toml_escape_string(base_url.unwrap_or("https://example.com"));
    let api_endpoint = toml_escape_string(api_url.unwrap_or("https://script.google.com/macros/s/YOUR_DEPLOYMENT_ID/exec"));

    let author_comment = if author.is_some() { "" } else { "  # TODO: Set author name" };
    let site_comment = if base_url.is_some() { "" } else { "  # TODO: Set site URL" };
    let api_comment = if api_url.is_some() { "" } else { "  # TODO: Set content API endpoint" };

    let toml = format!(
        "# Generated by folio init\n\
# Edit this file to configure your site\n\
\n\
[site]\n\
base_url = \"{site_url}\"{site_comment}\n\
author = \"{author_name}\"{author_comment}\n\
keywords = [\"software engineer\", \"blog\"]\n\
default_image = \"/profile/avatar.png\"\n\
\n\
[api]\n\
base_url = \"{api_endpoint}\"{api_comment}\n\
\n\
[build]\n\
output_dir = \"dist\"\n\
template = \"blog.html\"\n\
posts_dir = \"blog\"\n\
translations = \"public/i18n/en.json\"\n\
public_dir = \"public\"\n\
images_dir = \"images/blog\"\n\
\n\
# Locally hosted share images, by post slug (see `folio images`)\n\
[images]\n\
# \"my-first-post\" = \"my-first-post.jpg\"\n\
\n\
# [contact]\n\
# endpoint = \"https://script.google.com/macros/s/YOUR_FORM_ID/exec\"\n"
    );

    parse_site_toml_str(&toml).context("Generated site.toml is invalid")?;

    fs::write(base.join(CONFIG_FILE), toml)?;

    Ok(())
}

/// Write `{en,ar}.json` under `public/i18n` unless they already exist
fn generate_translation_stubs(base: &Path) -> Result<Vec<PathBuf>> {
    let dir = base.join(TRANSLATIONS_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let stubs = [
        ("en.json", r#"{
  "blog": {
    "title": "Blog",
    "noPosts": "No posts found",
    "loadMore": "Show more",
    "retry": "Try again",
    "backToBlog": "Back to Blog"
  }
}
"#),
        ("ar.json", r#"{
  "blog": {
    "title": "المدونة",
    "noPosts": "لا توجد مقالات",
    "loadMore": "عرض المزيد",
    "retry": "حاول مرة أخرى",
    "backToBlog": "العودة إلى المدونة"
  }
}
"#),
    ];

    let mut created = Vec::new();
    for (name, content) in stubs {
        let file = dir.join(name);
        if file.exists() {
            continue;
        }
        fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))?;
        created.push(Path::new(TRANSLATIONS_DIR).join(name));
    }
    Ok(created)
}
