use anyhow::{Context, Result};
use folio_core::config::CONFIG_FILE;
use folio_core::{SiteConfig, TranslationTable, parse_site_toml};
use std::path::{Path, PathBuf};

pub async fn run(path: PathBuf) -> Result<()> {
    println!("Validating site at: {}", path.display());

    let config = parse_site_toml(path.join(CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;

    println!("✓ {} valid", CONFIG_FILE);
    println!("  Site: {} by {}", config.site.base_url, config.site.author);
    println!("  Content API: {}", config.api.base_url);

    let translations_path = config.translations_path(&path);
    let table = TranslationTable::from_file(&translations_path)
        .with_context(|| format!("Failed to load translations {}", translations_path.display()))?;
    println!("✓ Translations: {} entries", table.len());

    let warnings = collect_warnings(&path, &config);
    if warnings.is_empty() {
        println!("✓ No warnings");
    } else {
        for warning in &warnings {
            println!("⚠️  {}", warning);
        }
    }

    Ok(())
}

/// Problems that don't stop a build but are worth knowing about
fn collect_warnings(root: &Path, config: &SiteConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let template = config.template_path(root);
    if !template.exists() {
        warnings.push(format!(
            "Template not found at {} (bundle the site before building)",
            template.display()
        ));
    }

    let images_dir = config.images_dir(root);
    for (slug, file) in &config.images {
        let image = images_dir.join(file);
        if !image.exists() {
            warnings.push(format!(
                "Image for '{}' missing: {} (run folio images)",
                slug,
                image.display()
            ));
        }
    }

    if config.contact.is_none() {
        warnings.push("No [contact] endpoint configured".to_string());
    }

    warnings
}
