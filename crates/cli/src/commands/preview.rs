use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path as UrlPath, Request, State},
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use folio_core::config::CONFIG_FILE;
use folio_core::parse_site_toml;
use folio_generator::post_file_name;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::ServeDir;

const RELOAD_SCRIPT: &str = r#"<script>
  // Live reload (folio preview)
  const folioReload = new EventSource('/_reload');
  folioReload.onmessage = () => location.reload();
  folioReload.onerror = () => folioReload.close();
</script>"#;

#[derive(Clone)]
struct PreviewState {
    output: PathBuf,
    posts_dir: PathBuf,
    template: PathBuf,
    reload_tx: broadcast::Sender<()>,
}

/// Serve the built site with live reload.
///
/// Static files come straight from the output directory. `/blog/{slug}`
/// is rewritten to the generated post page, falling back to the blog
/// template so the page can load the post itself, as the production host
/// does. HTML responses get a reload script; any change in the output
/// directory reloads open pages.
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("🌍 Starting preview server...");
    println!("   Site: {}", path.display());

    let config = parse_site_toml(path.join(CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", CONFIG_FILE))?;

    let output = config.output_dir(&path);
    if !output.is_dir() {
        anyhow::bail!(
            "Output directory {} does not exist\nBundle the site and run 'folio build {}' first",
            output.display(),
            path.display()
        );
    }
    println!("   ✓ Serving: {}", output.display());

    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = PreviewState {
        output: output.clone(),
        posts_dir: config.posts_dir(&path),
        template: config.template_path(&path),
        reload_tx: reload_tx.clone(),
    };

    let watcher_tx = reload_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watch_files(output, watcher_tx).await {
            eprintln!("File watcher error: {}", e);
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

fn router(state: PreviewState) -> Router {
    Router::new()
        .route("/_reload", get(sse_handler))
        .route("/blog/{slug}", get(post_handler))
        .fallback(static_handler)
        .with_state(state)
}

/// Watch for file changes and trigger reload
async fn watch_files(path: PathBuf, reload_tx: broadcast::Sender<()>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // Ignore hidden and editor backup files
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    println!("   📝 Output changed, reloading...");
                    let _ = reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<PreviewState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn post_handler(
    State(state): State<PreviewState>,
    UrlPath(slug): UrlPath<String>,
) -> Response {
    // Generated pages are also linked by file name
    let slug = slug
        .strip_prefix("post-")
        .and_then(|s| s.strip_suffix(".html"))
        .unwrap_or(&slug);

    let candidates = post_page_path(&state.posts_dir, slug)
        .into_iter()
        .chain(std::iter::once(state.template.clone()));

    for page in candidates {
        if let Ok(html) = tokio::fs::read_to_string(&page).await {
            log::debug!("[preview] /blog/{} -> {}", slug, page.display());
            return Html(with_reload_script(&html)).into_response();
        }
    }

    (StatusCode::NOT_FOUND, format!("No page for post '{}'", slug)).into_response()
}

async fn static_handler(State(state): State<PreviewState>, request: Request) -> Response {
    if let Some(page) = html_target(&state.output, request.uri().path())
        && let Ok(html) = tokio::fs::read_to_string(&page).await
    {
        return Html(with_reload_script(&html)).into_response();
    }

    match ServeDir::new(&state.output).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// Generated page for a slug, if the slug is usable as a file name
fn post_page_path(posts_dir: &Path, slug: &str) -> Option<PathBuf> {
    post_file_name(slug).ok().map(|name| posts_dir.join(name))
}

/// HTML file a request path refers to: `*.html` files and directory
/// indexes. Paths escaping the output directory give `None`.
fn html_target(output: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let target = output.join(relative);
    if relative.extension().is_some_and(|ext| ext == "html") {
        return Some(target);
    }
    if decoded.ends_with('/') || target.is_dir() {
        return Some(target.join("index.html"));
    }
    None
}

/// Insert the reload script before `</body>`, or append it
fn with_reload_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}\n{}", &html[..pos], RELOAD_SCRIPT, &html[pos..]),
        None => format!("{}\n{}", html, RELOAD_SCRIPT),
    }
}
