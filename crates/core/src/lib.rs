pub mod config;
pub mod error;
pub mod i18n;
pub mod text;
pub mod types;

pub use config::{SiteConfig, parse_site_toml, parse_site_toml_str};
pub use error::{Error, Result};
pub use i18n::TranslationTable;
pub use types::*;
