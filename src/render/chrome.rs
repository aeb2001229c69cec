// src/render/chrome.rs
// =============================================================================
// RenderGateway backed by headless Chrome (chromiumoxide / DevTools protocol).
//
// One browser process is shared by the whole run. Every render gets its own
// browser context (like a fresh incognito window), so cookies and storage of
// one page never leak into another page rendered at the same time.
//
// The session sits behind a tokio RwLock:
// - render_page takes the read side (many renders at once)
// - initialize / close take the write side (never while a render runs)
// =============================================================================

use super::{RenderGateway, RenderOptions};
use crate::config::{Config, Viewport};
use crate::error::RenderError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::handler::viewport::Viewport as PageViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// How often wait conditions are re-checked
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// No new network resources for this long counts as "network idle"
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// How long close() waits for the CDP handler task to wind down
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// Number of loaded resources, or -1 while the document is still loading
const RESOURCE_COUNT_JS: &str = r#"
    document.readyState === 'complete'
        ? performance.getEntriesByType('resource').length
        : -1
"#;

// A live browser plus the task pumping its DevTools events
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
}

pub struct ChromeGateway {
    chrome_bin: Option<PathBuf>,
    viewport: Viewport,
    user_agent: Option<String>,
    session: RwLock<Option<Session>>,
}

impl ChromeGateway {
    pub fn new(chrome_bin: Option<PathBuf>, viewport: Viewport, user_agent: Option<String>) -> Self {
        Self {
            chrome_bin,
            viewport,
            user_agent,
            session: RwLock::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.chrome_bin.clone(),
            config.viewport,
            config.user_agent.clone(),
        )
    }

    fn browser_config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.viewport.width, self.viewport.height)
            .viewport(PageViewport {
                width: self.viewport.width,
                height: self.viewport.height,
                ..Default::default()
            })
            .args(vec![
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-extensions",
                "--no-first-run",
                "--disable-sync",
            ]);

        // Without an explicit binary chromiumoxide searches the usual locations
        if let Some(binary) = resolve_chrome_binary(self.chrome_bin.clone())? {
            tracing::debug!("Using Chrome binary: {}", binary.display());
            builder = builder.chrome_executable(binary);
        }

        builder.build().map_err(RenderError::Launch)
    }
}

#[async_trait]
impl RenderGateway for ChromeGateway {
    async fn initialize(&self) -> Result<(), RenderError> {
        let mut session = self.session.write().await;
        if session.is_some() {
            return Ok(());
        }

        tracing::info!("Initializing browser");
        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // The handler stream must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        *session = Some(Session { browser, handler });
        Ok(())
    }

    async fn render_page(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
        let guard = self.session.read().await;
        let browser = &guard.as_ref().ok_or(RenderError::NotInitialized)?.browser;

        tracing::info!("Rendering page: {}", url);

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| navigation_error(url, e))?
            .result
            .browser_context_id;

        let html = match open_page(browser, url, context_id.clone()).await {
            Ok(page) => {
                let html = capture(&page, url, options, self.user_agent.as_deref()).await;
                if let Err(e) = page.close().await {
                    tracing::debug!("Failed to close page for {}: {}", url, e);
                }
                html
            }
            Err(e) => Err(e),
        };

        dispose_context(browser, context_id).await;

        if let Err(e) = &html {
            tracing::error!("Error rendering page {}: {}", url, e);
        }
        html
    }

    async fn close(&self) -> Result<(), RenderError> {
        let Some(mut session) = self.session.write().await.take() else {
            return Ok(());
        };

        if let Err(e) = session.browser.close().await {
            tracing::warn!("Browser did not shut down cleanly: {}", e);
        }
        if time::timeout(SHUTDOWN_GRACE, &mut session.handler).await.is_err() {
            session.handler.abort();
        }

        tracing::info!("Browser closed");
        Ok(())
    }
}

// Opens a blank page inside the given browser context
async fn open_page(
    browser: &Browser,
    url: &str,
    context_id: BrowserContextId,
) -> Result<Page, RenderError> {
    let target = CreateTargetParams::builder()
        .url("about:blank")
        .browser_context_id(context_id)
        .build()
        .map_err(|reason| RenderError::Navigation {
            url: url.to_string(),
            reason,
        })?;

    browser
        .new_page(target)
        .await
        .map_err(|e| navigation_error(url, e))
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        tracing::debug!("Failed to dispose browser context: {}", e);
    }
}

// Navigates, applies every wait condition, then reads back the DOM as HTML
async fn capture(
    page: &Page,
    url: &str,
    options: &RenderOptions,
    user_agent: Option<&str>,
) -> Result<String, RenderError> {
    if let Some(user_agent) = user_agent {
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| navigation_error(url, e))?;
    }

    match time::timeout(options.timeout, page.goto(url)).await {
        Err(_) => {
            return Err(RenderError::Timeout {
                url: url.to_string(),
                timeout: options.timeout,
            })
        }
        Ok(Err(e)) => return Err(navigation_error(url, e)),
        Ok(Ok(_)) => {}
    }

    if options.wait_for_network_idle {
        wait_for_network_idle(page, url, options.timeout).await?;
    }

    for selector in &options.wait_for_selectors {
        tracing::debug!("Waiting for selector: {}", selector);
        wait_for_selector(page, url, selector, options.timeout).await?;
    }

    if let Some(extra) = options.additional_wait {
        tracing::debug!("Waiting additional {}ms", extra.as_millis());
        time::sleep(extra).await;
    }

    page.content().await.map_err(|e| RenderError::Capture {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

// Waits until the document is complete and no new resources appeared for
// NETWORK_IDLE_WINDOW
async fn wait_for_network_idle(page: &Page, url: &str, timeout: Duration) -> Result<(), RenderError> {
    let deadline = Instant::now() + timeout;
    let mut last_count: Option<i64> = None;
    let mut quiet_since = Instant::now();

    loop {
        let count: i64 = evaluate(page, url, RESOURCE_COUNT_JS).await?;
        let now = Instant::now();

        if count < 0 || last_count != Some(count) {
            last_count = Some(count);
            quiet_since = now;
        } else if now.duration_since(quiet_since) >= NETWORK_IDLE_WINDOW {
            return Ok(());
        }

        if now >= deadline {
            return Err(RenderError::Timeout {
                url: url.to_string(),
                timeout,
            });
        }
        time::sleep(POLL_INTERVAL).await;
    }
}

// Waits until `selector` matches an element that is rendered and not hidden
async fn wait_for_selector(
    page: &Page,
    url: &str,
    selector: &str,
    timeout: Duration,
) -> Result<(), RenderError> {
    // serde_json gives us a correctly quoted JS string literal
    let quoted = serde_json::to_string(selector).map_err(|e| RenderError::Capture {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({quoted});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            return style.visibility !== 'hidden' && style.display !== 'none'
                && (rect.width > 0 || rect.height > 0);
        }})()"#
    );

    let deadline = Instant::now() + timeout;
    loop {
        if evaluate::<bool>(page, url, &script).await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(RenderError::SelectorTimeout {
                url: url.to_string(),
                selector: selector.to_string(),
                timeout,
            });
        }
        time::sleep(POLL_INTERVAL).await;
    }
}

async fn evaluate<T: serde::de::DeserializeOwned>(
    page: &Page,
    url: &str,
    script: &str,
) -> Result<T, RenderError> {
    let capture_error = |reason: String| RenderError::Capture {
        url: url.to_string(),
        reason,
    };
    page.evaluate(script)
        .await
        .map_err(|e| capture_error(e.to_string()))?
        .into_value()
        .map_err(|e| capture_error(e.to_string()))
}

fn navigation_error(url: &str, error: impl std::fmt::Display) -> RenderError {
    RenderError::Navigation {
        url: url.to_string(),
        reason: error.to_string(),
    }
}

// Picks the Chrome executable: explicit path first, then CHROME_BIN / CHROMIUM_BIN
//
// Returns: Ok(None) when nothing is configured, Err if an explicit path is wrong
fn resolve_chrome_binary(override_path: Option<PathBuf>) -> Result<Option<PathBuf>, RenderError> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(Some(path));
        }
        return Err(RenderError::Launch(format!(
            "Chrome/Chromium binary not found at provided path: {}",
            path.display()
        )));
    }

    for key in ["CHROME_BIN", "CHROMIUM_BIN"] {
        if let Some(value) = std::env::var_os(key) {
            let candidate = PathBuf::from(value);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_binary_is_launch_error() {
        let result = resolve_chrome_binary(Some(PathBuf::from("/no/such/chrome")));
        assert!(matches!(result, Err(RenderError::Launch(_))));
    }

    #[test]
    fn test_explicit_binary_is_used() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = resolve_chrome_binary(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(result.as_deref(), Some(file.path()));
    }

    #[tokio::test]
    async fn test_render_before_initialize_fails() {
        let gateway = ChromeGateway::from_config(&Config::default());
        let options = RenderOptions::from_config(&Config::default());
        let err = gateway
            .render_page("https://example.com/", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::NotInitialized));
    }

    #[tokio::test]
    async fn test_close_without_initialize_is_noop() {
        let gateway = ChromeGateway::from_config(&Config::default());
        gateway.close().await.unwrap();
        gateway.close().await.unwrap();
    }
}
