//! UI state: language, theme and the loaded translation table.
//!
//! Observers are called synchronously, in subscription order, after every
//! mutation. Nothing is batched.

use async_trait::async_trait;
use folio_core::{Language, Result, TranslationTable};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub const LANGUAGE_KEY: &str = "preferredLanguage";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// Device color-scheme preference
    pub fn from_device(prefers_dark: bool) -> Self {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persisted key/value preferences (browser local storage)
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Source of per-language translation tables
#[async_trait]
pub trait TranslationLoader: Send + Sync {
    async fn load(&self, language: Language) -> Result<TranslationTable>;
}

/// Loads `{dir}/{code}.json`
#[derive(Debug, Clone)]
pub struct FileTranslationLoader {
    dir: PathBuf,
}

impl FileTranslationLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TranslationLoader for FileTranslationLoader {
    async fn load(&self, language: Language) -> Result<TranslationTable> {
        let path = self.dir.join(format!("{}.json", language.code()));
        let content = tokio::fs::read_to_string(&path).await?;
        TranslationTable::from_json_str(&content)
    }
}

pub trait StateObserver {
    fn on_state_change(&self, state: &StateSnapshot<'_>);
}

impl<F> StateObserver for F
where
    F: Fn(&StateSnapshot<'_>),
{
    fn on_state_change(&self, state: &StateSnapshot<'_>) {
        self(state)
    }
}

/// Read-only view handed to observers
#[derive(Debug, Clone, Copy)]
pub struct StateSnapshot<'a> {
    pub language: Language,
    pub theme: Theme,
    pub translations: &'a TranslationTable,
}

impl StateSnapshot<'_> {
    pub fn t<'k>(&'k self, key: &'k str) -> &'k str {
        self.translations.t(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct AppState<S: Storage> {
    language: Language,
    theme: Theme,
    translations: TranslationTable,
    storage: S,
    observers: Vec<(SubscriptionId, Box<dyn StateObserver>)>,
    next_id: u64,
}

impl<S: Storage> AppState<S> {
    pub fn new(storage: S) -> Self {
        Self {
            language: Language::default(),
            theme: Theme::default(),
            translations: TranslationTable::default(),
            storage,
            observers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// `rtl` or `ltr` for the document root
    pub fn direction(&self) -> &'static str {
        self.language.direction()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn translations(&self) -> &TranslationTable {
        &self.translations
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Translation for `key`, or the key itself
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.translations.t(key)
    }

    pub fn subscribe(&mut self, observer: impl StateObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false when `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        let snapshot = StateSnapshot {
            language: self.language,
            theme: self.theme,
            translations: &self.translations,
        };
        for (_, observer) in &self.observers {
            observer.on_state_change(&snapshot);
        }
    }

    /// Pick the starting language and theme, then load translations.
    ///
    /// Language: saved preference, else the browser locale (`ar*` is Arabic),
    /// else English. Theme: saved preference, else the device preference.
    /// Returns false when the translation table could not be loaded.
    pub async fn initialize<L>(&mut self, loader: &L, browser_locale: &str, prefers_dark: bool) -> bool
    where
        L: TranslationLoader + ?Sized,
    {
        let theme = self
            .storage
            .get(THEME_KEY)
            .and_then(|name| Theme::from_name(&name))
            .unwrap_or_else(|| Theme::from_device(prefers_dark));
        self.set_theme(theme);

        let language = self
            .storage
            .get(LANGUAGE_KEY)
            .and_then(|code| Language::from_code(&code))
            .unwrap_or_else(|| Language::from_browser_locale(browser_locale));
        self.load_translations(loader, language).await
    }

    async fn load_translations<L>(&mut self, loader: &L, language: Language) -> bool
    where
        L: TranslationLoader + ?Sized,
    {
        match loader.load(language).await {
            Ok(table) => {
                self.translations = table;
                self.language = language;
                self.notify();
                true
            }
            Err(e) => {
                log::error!("[client] Failed to load translations for '{}': {}", language, e);
                false
            }
        }
    }

    /// Switch language. Unchanged language is a successful no-op; on a load
    /// failure the previous language and table stay active.
    pub async fn change_language<L>(&mut self, loader: &L, language: Language) -> bool
    where
        L: TranslationLoader + ?Sized,
    {
        if language == self.language {
            return true;
        }
        let loaded = self.load_translations(loader, language).await;
        if loaded {
            self.storage.set(LANGUAGE_KEY, language.code());
        }
        loaded
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.storage.set(THEME_KEY, theme.name());
        self.notify();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.theme.toggled();
        self.set_theme(theme);
        theme
    }
}

impl<S: Storage> fmt::Debug for AppState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("language", &self.language)
            .field("theme", &self.theme)
            .field("translations", &self.translations.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Error;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    /// Serves canned tables; languages without one fail to load.
    #[derive(Default)]
    struct FakeLoader {
        tables: HashMap<Language, TranslationTable>,
        requests: Mutex<Vec<Language>>,
    }

    impl FakeLoader {
        fn with(mut self, language: Language, json: &str) -> Self {
            self.tables
                .insert(language, TranslationTable::from_json_str(json).unwrap());
            self
        }

        fn requests(&self) -> Vec<Language> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranslationLoader for FakeLoader {
        async fn load(&self, language: Language) -> Result<TranslationTable> {
            self.requests.lock().unwrap().push(language);
            self.tables
                .get(&language)
                .cloned()
                .ok_or_else(|| Error::Http("HTTP error! status: 404".to_string()))
        }
    }

    fn loader() -> FakeLoader {
        FakeLoader::default()
            .with(Language::En, r#"{"nav": {"blog": "Blog"}}"#)
            .with(Language::Ar, r#"{"nav": {"blog": "المدونة"}}"#)
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&StateSnapshot<'_>)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let observer = move |state: &StateSnapshot<'_>| {
            sink.borrow_mut()
                .push(format!("{}:{}:{}", state.language, state.theme, state.t("nav.blog")));
        };
        (log, observer)
    }

    #[tokio::test]
    async fn test_initialize_uses_saved_language() {
        let mut storage = MemoryStorage::new();
        storage.set(LANGUAGE_KEY, "ar");
        let mut state = AppState::new(storage);

        assert!(state.initialize(&loader(), "en-US", false).await);
        assert_eq!(state.language(), Language::Ar);
        assert_eq!(state.direction(), "rtl");
        assert_eq!(state.t("nav.blog"), "المدونة");
    }

    #[tokio::test]
    async fn test_initialize_falls_back_to_browser_locale() {
        let mut state = AppState::new(MemoryStorage::new());
        assert!(state.initialize(&loader(), "ar-SA", false).await);
        assert_eq!(state.language(), Language::Ar);

        let mut state = AppState::new(MemoryStorage::new());
        assert!(state.initialize(&loader(), "fr-FR", false).await);
        assert_eq!(state.language(), Language::En);
    }

    #[tokio::test]
    async fn test_initialize_ignores_unknown_saved_language() {
        let mut storage = MemoryStorage::new();
        storage.set(LANGUAGE_KEY, "de");
        let mut state = AppState::new(storage);

        state.initialize(&loader(), "en-GB", false).await;
        assert_eq!(state.language(), Language::En);
    }

    #[tokio::test]
    async fn test_initialize_theme_preference() {
        let mut state = AppState::new(MemoryStorage::new());
        state.initialize(&loader(), "en", true).await;
        assert_eq!(state.theme(), Theme::Dark);
        assert_eq!(state.storage().get(THEME_KEY).as_deref(), Some("dark"));

        let mut storage = MemoryStorage::new();
        storage.set(THEME_KEY, "light");
        let mut state = AppState::new(storage);
        state.initialize(&loader(), "en", true).await;
        assert_eq!(state.theme(), Theme::Light);
    }

    #[tokio::test]
    async fn test_change_language_persists_and_notifies() {
        let loader = loader();
        let mut state = AppState::new(MemoryStorage::new());
        state.initialize(&loader, "en-US", false).await;

        let (log, observer) = recorder();
        state.subscribe(observer);

        assert!(state.change_language(&loader, Language::Ar).await);
        assert_eq!(state.storage().get(LANGUAGE_KEY).as_deref(), Some("ar"));
        assert_eq!(*log.borrow(), vec!["ar:light:المدونة".to_string()]);
    }

    #[tokio::test]
    async fn test_change_to_same_language_is_noop() {
        let loader = loader();
        let mut state = AppState::new(MemoryStorage::new());
        state.initialize(&loader, "en-US", false).await;

        let (log, observer) = recorder();
        state.subscribe(observer);

        assert!(state.change_language(&loader, Language::En).await);
        assert!(log.borrow().is_empty());
        assert_eq!(loader.requests(), vec![Language::En]);
        assert_eq!(state.storage().get(LANGUAGE_KEY), None);
    }

    #[tokio::test]
    async fn test_failed_language_change_keeps_previous_table() {
        let loader = FakeLoader::default().with(Language::En, r#"{"nav": {"blog": "Blog"}}"#);
        let mut state = AppState::new(MemoryStorage::new());
        state.initialize(&loader, "en-US", false).await;

        assert!(!state.change_language(&loader, Language::Ar).await);
        assert_eq!(state.language(), Language::En);
        assert_eq!(state.t("nav.blog"), "Blog");
        assert_eq!(state.storage().get(LANGUAGE_KEY), None);
    }

    #[test]
    fn test_observers_run_in_subscription_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut state = AppState::new(MemoryStorage::new());

        for name in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            state.subscribe(move |_: &StateSnapshot<'_>| order.borrow_mut().push(name));
        }

        state.set_theme(Theme::Dark);
        state.toggle_theme();

        assert_eq!(
            *order.borrow(),
            vec!["first", "second", "third", "first", "second", "third"]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (log, observer) = recorder();
        let mut state = AppState::new(MemoryStorage::new());
        let id = state.subscribe(observer);

        state.set_theme(Theme::Dark);
        assert!(state.unsubscribe(id));
        assert!(!state.unsubscribe(id));
        state.set_theme(Theme::Light);

        assert_eq!(*log.borrow(), vec!["en:dark:nav.blog".to_string()]);
    }

    #[test]
    fn test_toggle_theme_persists() {
        let mut state = AppState::new(MemoryStorage::new());
        assert_eq!(state.toggle_theme(), Theme::Dark);
        assert_eq!(state.toggle_theme(), Theme::Light);
        assert_eq!(state.storage().get(THEME_KEY).as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn test_file_translation_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ar.json"), r#"{"blog": {"title": "المدونة"}}"#).unwrap();

        let loader = FileTranslationLoader::new(dir.path());
        let table = loader.load(Language::Ar).await.unwrap();
        assert_eq!(table.get("blog.title"), Some("المدونة"));
        assert!(loader.load(Language::En).await.is_err());
    }
}
