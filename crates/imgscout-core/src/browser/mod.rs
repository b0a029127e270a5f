//! DOM query adapter.
//!
//! The pipeline only talks to a [`BrowsingSession`]: a listing context that stays open for
//! the whole query, plus at most one temporary context used to visit source pages.
//! "Not found" and "timed out" are ordinary `Ok(None)` / `Ok(false)` outcomes; `Err` means
//! the browser itself is in trouble and the session should stop.
//!
//! [`ChromeSession`] is the production implementation (headless_chrome).

mod chrome;

pub use chrome::ChromeSession;

use anyhow::Result;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Attributes read from a single element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementSnapshot {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub href: Option<String>,
}

/// One `<img>` on a page, captured once per visit. Declared dimensions that are missing
/// or unparseable are 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSnapshot {
    pub src: String,
    pub alt: Option<String>,
    pub width: u32,
    pub height: u32,
}

pub trait BrowsingSession {
    /// Navigate the listing context to `url` and wait for it to load.
    fn open_listing(&mut self, url: &str) -> Result<()>;

    /// Wait up to `wait` for `selector` to match in the listing, then return the match count.
    fn count_results(&mut self, selector: &str, wait: Duration) -> Result<usize>;

    /// Scroll the `index`-th match of `selector` into view. `Ok(false)` if it no longer exists.
    fn scroll_result_into_view(&mut self, selector: &str, index: usize) -> Result<bool>;

    /// Click the `index`-th match of `selector`. `Ok(false)` if it no longer exists.
    fn click_result(&mut self, selector: &str, index: usize) -> Result<bool>;

    /// Wait up to `wait` for `selector` in the active context.
    fn wait_for_element(&mut self, selector: &str, wait: Duration) -> Result<Option<ElementSnapshot>>;

    /// Look up `selector` in the active context without waiting.
    fn find_element(&mut self, selector: &str) -> Result<Option<ElementSnapshot>>;

    /// Open a second browsing context and make it active.
    fn open_temporary_context(&mut self) -> Result<()>;

    /// Load `url` in the active context. `Ok(false)` when it fails or does not settle in `wait`.
    fn load_page(&mut self, url: &str, wait: Duration) -> Result<bool>;

    /// Capture every image element of the active context, in DOM order.
    fn snapshot_images(&mut self) -> Result<Vec<ImageSnapshot>>;

    /// Close the temporary context (if any) and make the listing active again.
    fn close_temporary_context(&mut self) -> Result<()>;
}

/// Runs `f` inside a temporary context showing `url`; `f` receives whether the page loaded.
///
/// The temporary context is closed on every exit path, including when opening, loading or
/// `f` fails. An error from `f` takes precedence over an error from closing.
pub fn with_temporary_context<S, T, F>(session: &mut S, url: &str, load_wait: Duration, f: F) -> Result<T>
where
    S: BrowsingSession + ?Sized,
    F: FnOnce(&mut S, bool) -> Result<T>,
{
    let outcome = session
        .open_temporary_context()
        .and_then(|()| session.load_page(url, load_wait))
        .and_then(|loaded| f(session, loaded));
    let closed = session.close_temporary_context();
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), close_result) => {
            if let Err(close_err) = close_result {
                tracing::warn!("closing temporary context after failure: {:#}", close_err);
            }
            Err(e)
        }
        (Ok(_), Err(close_err)) => Err(close_err),
    }
}

/// Parses a declared `width`/`height` attribute; anything that is not a plain pixel count is 0.
pub fn parse_declared_dimension(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else { return 0 };
    let raw = raw.trim();
    let raw = raw.strip_suffix("px").unwrap_or(raw).trim_end();
    raw.parse::<u32>().unwrap_or(0)
}

/// Sleeps for `ms` milliseconds; 0 is a no-op.
pub(crate) fn pause(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Calls `check` every `interval` until it yields a value or `wait` elapses (at least one call).
pub(crate) fn poll_until<T>(
    wait: Duration,
    interval: Duration,
    mut check: impl FnMut() -> Result<Option<T>>,
) -> Result<Option<T>> {
    let deadline = Instant::now() + wait;
    loop {
        if let Some(v) = check()? {
            return Ok(Some(v));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(interval.min(deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_dimension_parsing() {
        assert_eq!(parse_declared_dimension(Some("400")), 400);
        assert_eq!(parse_declared_dimension(Some(" 300 ")), 300);
        assert_eq!(parse_declared_dimension(Some("250px")), 250);
        assert_eq!(parse_declared_dimension(Some("100%")), 0);
        assert_eq!(parse_declared_dimension(Some("auto")), 0);
        assert_eq!(parse_declared_dimension(Some("")), 0);
        assert_eq!(parse_declared_dimension(None), 0);
    }

    #[test]
    fn poll_until_returns_first_hit() {
        let mut calls = 0;
        let r = poll_until(Duration::from_secs(1), Duration::from_millis(1), || {
            calls += 1;
            Ok((calls == 3).then_some(calls))
        })
        .unwrap();
        assert_eq!(r, Some(3));
    }

    #[test]
    fn poll_until_times_out_as_none() {
        let r: Option<()> =
            poll_until(Duration::from_millis(5), Duration::from_millis(1), || Ok(None)).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn poll_until_zero_wait_checks_once() {
        let mut calls = 0;
        let r = poll_until(Duration::ZERO, Duration::from_millis(1), || {
            calls += 1;
            Ok(Some(()))
        })
        .unwrap();
        assert_eq!(r, Some(()));
        assert_eq!(calls, 1);
    }
}
