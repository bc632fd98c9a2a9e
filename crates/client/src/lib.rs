// Client-side site logic: UI state, blog views and the contact form,
// written against injected page, storage and content seams.

pub mod contact;
pub mod list;
pub mod location;
pub mod page;
pub mod post;
pub mod render;
pub mod state;

pub use list::{BlogList, BlogListView, LanguageFilter, POSTS_PER_PAGE};
pub use location::{resolve_slug, resolve_slug_from_url};
pub use page::{BlogPage, MemoryPage, Region};
pub use post::{EmbeddedData, Freshness, PostSource, PostView};
pub use state::{AppState, MemoryStorage, StateObserver, Storage, Theme, TranslationLoader};
