//! headless_chrome-backed browsing session: one listing tab plus an optional temporary tab.
//!
//! Attribute reads go through a single `Runtime.evaluate` returning JSON, so a missing
//! element is a `null` result rather than a driver error. Any other element-level failure
//! (no box model, intercepted click, script exception) is a miss as long as the tab still
//! answers; only a tab that stopped responding is an `Err`.

use super::{parse_declared_dimension, poll_until, BrowsingSession, ElementSnapshot, ImageSnapshot};
use crate::config::BrowserConfig;
use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChromeSession {
    // Dropping the browser kills the Chrome process; keep it alive with the tabs.
    browser: Browser,
    listing: Arc<Tab>,
    temporary: Option<Arc<Tab>>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(default)]
    src: String,
    alt: Option<String>,
    width: Option<String>,
    height: Option<String>,
}

impl ChromeSession {
    pub fn launch(cfg: &BrowserConfig) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(cfg.headless)
            .window_size(Some(cfg.window_size))
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| anyhow!("invalid browser launch options: {}", e))?;
        let browser = Browser::new(options).context("failed to launch Chrome")?;
        let listing = browser.new_tab().context("failed to open listing tab")?;
        tracing::debug!(headless = cfg.headless, "browser launched");
        Ok(Self {
            browser,
            listing,
            temporary: None,
        })
    }

    fn active(&self) -> &Arc<Tab> {
        self.temporary.as_ref().unwrap_or(&self.listing)
    }

    /// Evaluates an expression that returns a JSON string (or null) in the active tab.
    /// A script that throws on a live tab reads as null.
    fn eval_json(&self, expression: &str) -> Result<Option<String>> {
        let tab = self.active();
        let remote = match tab.evaluate(expression, false) {
            Ok(remote) => remote,
            Err(e) => return miss_or_lost(tab_alive(tab), "script evaluation", e, None),
        };
        Ok(match remote.value {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
    }

    fn count_matches(&self, selector: &str) -> Result<usize> {
        let expr = format!(
            "String(document.querySelectorAll({}).length)",
            js_string(selector)?
        );
        let count = self
            .eval_json(&expr)?
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        Ok(count)
    }

    fn with_nth_result(
        &self,
        selector: &str,
        index: usize,
        action: impl FnOnce(&headless_chrome::Element<'_>) -> Result<()>,
    ) -> Result<bool> {
        if index >= self.count_matches(selector)? {
            return Ok(false);
        }
        let elements = match self.listing.find_elements(selector) {
            Ok(elements) => elements,
            Err(e) => return miss_or_lost(tab_alive(&self.listing), "result lookup", e, false),
        };
        let Some(el) = elements.get(index) else {
            return Ok(false);
        };
        match action(el) {
            Ok(()) => Ok(true),
            Err(e) => miss_or_lost(tab_alive(&self.listing), "result action", e, false),
        }
    }

    fn read_element(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return null; \
             return JSON.stringify({{ src: el.currentSrc || el.src || el.getAttribute('src'), \
             alt: el.getAttribute('alt'), \
             href: el.href || el.getAttribute('href') }}); }})()",
            js_string(selector)?
        );
        match self.eval_json(&expr)? {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).context("malformed element snapshot")?,
            )),
            None => Ok(None),
        }
    }
}

/// Whether the tab still answers a trivial script.
fn tab_alive(tab: &Tab) -> bool {
    tab.evaluate("1", false).is_ok()
}

/// Turns a DOM-level failure into the ordinary `miss` outcome while the tab is alive;
/// a dead tab is a session-level error.
fn miss_or_lost<T>(alive: bool, what: &str, err: anyhow::Error, miss: T) -> Result<T> {
    if alive {
        tracing::debug!("{} failed on a live tab, treating as a miss: {:#}", what, err);
        Ok(miss)
    } else {
        Err(err.context(format!("{} failed and the browser tab is gone", what)))
    }
}

/// Quotes `s` as a JavaScript string literal.
fn js_string(s: &str) -> Result<String> {
    Ok(serde_json::to_string(s)?)
}

impl BrowsingSession for ChromeSession {
    fn open_listing(&mut self, url: &str) -> Result<()> {
        self.close_temporary_context()?;
        self.listing
            .navigate_to(url)
            .with_context(|| format!("navigate to {}", url))?
            .wait_until_navigated()
            .with_context(|| format!("listing {} did not load", url))?;
        tracing::debug!(%url, "listing opened");
        Ok(())
    }

    fn count_results(&mut self, selector: &str, wait: Duration) -> Result<usize> {
        let found = poll_until(wait, POLL_INTERVAL, || {
            let n = self.count_matches(selector)?;
            Ok((n > 0).then_some(n))
        })?;
        Ok(found.unwrap_or(0))
    }

    fn scroll_result_into_view(&mut self, selector: &str, index: usize) -> Result<bool> {
        self.with_nth_result(selector, index, |el| {
            el.scroll_into_view().context("scroll into view failed")?;
            Ok(())
        })
    }

    fn click_result(&mut self, selector: &str, index: usize) -> Result<bool> {
        self.with_nth_result(selector, index, |el| {
            el.click().context("click failed")?;
            Ok(())
        })
    }

    fn wait_for_element(&mut self, selector: &str, wait: Duration) -> Result<Option<ElementSnapshot>> {
        poll_until(wait, POLL_INTERVAL, || self.read_element(selector))
    }

    fn find_element(&mut self, selector: &str) -> Result<Option<ElementSnapshot>> {
        self.read_element(selector)
    }

    fn open_temporary_context(&mut self) -> Result<()> {
        if self.temporary.is_some() {
            anyhow::bail!("temporary context already open");
        }
        let tab = self.browser.new_tab().context("failed to open temporary tab")?;
        self.temporary = Some(tab);
        Ok(())
    }

    fn load_page(&mut self, url: &str, wait: Duration) -> Result<bool> {
        let tab = Arc::clone(self.active());
        tab.set_default_timeout(wait);
        if let Err(e) = tab.navigate_to(url) {
            tracing::debug!(%url, "navigation failed: {:#}", e);
            return Ok(false);
        }
        match tab.wait_until_navigated() {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!(%url, "page did not settle: {:#}", e);
                Ok(false)
            }
        }
    }

    fn snapshot_images(&mut self) -> Result<Vec<ImageSnapshot>> {
        let expr = "JSON.stringify(Array.from(document.images).map(img => ({ \
                    src: img.currentSrc || img.src || '', \
                    alt: img.getAttribute('alt'), \
                    width: img.getAttribute('width'), \
                    height: img.getAttribute('height') })))";
        let Some(json) = self.eval_json(expr)? else {
            return Ok(Vec::new());
        };
        let raw: Vec<RawImage> = serde_json::from_str(&json).context("malformed image snapshot")?;
        Ok(raw
            .into_iter()
            .map(|r| ImageSnapshot {
                width: parse_declared_dimension(r.width.as_deref()),
                height: parse_declared_dimension(r.height.as_deref()),
                src: r.src,
                alt: r.alt,
            })
            .collect())
    }

    fn close_temporary_context(&mut self) -> Result<()> {
        let Some(tab) = self.temporary.take() else {
            return Ok(());
        };
        if let Err(e) = tab.close(true) {
            tracing::warn!("closing temporary tab failed: {:#}", e);
        }
        self.listing
            .activate()
            .context("failed to re-activate listing tab")?;
        Ok(())
    }
}
