//! Scripted in-memory `BrowsingSession`.
//!
//! A listing is a list of results; each result scripts what the detail panel shows after it
//! is clicked. Source pages are keyed by URL. The session records every selector it is asked
//! about and every temporary-context open/close so tests can assert on them.

use anyhow::{anyhow, Result};
use imgscout_core::browser::{BrowsingSession, ElementSnapshot, ImageSnapshot};
use imgscout_core::config::SelectorConfig;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ScriptedResult {
    pub activatable: bool,
    /// Scrolls fine but the click does not land (covered or detached thumbnail).
    pub click_fails: bool,
    pub primary: Option<ElementSnapshot>,
    pub broader: Option<ElementSnapshot>,
    pub source_link: Option<String>,
}

impl ScriptedResult {
    pub fn new() -> Self {
        Self {
            activatable: true,
            ..Default::default()
        }
    }

    pub fn primary(mut self, src: &str, alt: Option<&str>) -> Self {
        self.primary = Some(image_element(src, alt));
        self
    }

    /// A primary marker element that carries no `src` attribute.
    pub fn primary_without_src(mut self, alt: Option<&str>) -> Self {
        self.primary = Some(ElementSnapshot {
            src: None,
            alt: alt.map(str::to_string),
            href: None,
        });
        self
    }

    pub fn broader(mut self, src: &str, alt: Option<&str>) -> Self {
        self.broader = Some(image_element(src, alt));
        self
    }

    pub fn source_link(mut self, href: &str) -> Self {
        self.source_link = Some(href.to_string());
        self
    }

    pub fn gone(mut self) -> Self {
        self.activatable = false;
        self
    }

    pub fn unclickable(mut self) -> Self {
        self.click_fails = true;
        self
    }
}

fn image_element(src: &str, alt: Option<&str>) -> ElementSnapshot {
    ElementSnapshot {
        src: Some(src.to_string()),
        alt: alt.map(str::to_string),
        href: None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub loads: bool,
    pub images: Vec<ImageSnapshot>,
    /// Snapshotting this page fails as if the tab crashed.
    pub crashes: bool,
}

impl ScriptedPage {
    pub fn with_images(images: Vec<ImageSnapshot>) -> Self {
        Self {
            loads: true,
            images,
            crashes: false,
        }
    }
}

pub fn img(src: &str, width: u32, height: u32) -> ImageSnapshot {
    ImageSnapshot {
        src: src.to_string(),
        alt: None,
        width,
        height,
    }
}

#[derive(Debug, Default)]
pub struct ScriptedSession {
    selectors: SelectorConfig,
    pub listing_fails_for: Vec<String>,
    pub results: Vec<ScriptedResult>,
    pub pages: HashMap<String, ScriptedPage>,

    pub listings_opened: Vec<String>,
    pub queried: Vec<String>,
    pub pages_loaded: Vec<String>,
    pub contexts_opened: usize,
    pub contexts_closed: usize,
    active_result: Option<usize>,
    temporary: Option<String>,
}

impl ScriptedSession {
    pub fn new(results: Vec<ScriptedResult>) -> Self {
        Self {
            selectors: SelectorConfig::default(),
            results,
            ..Default::default()
        }
    }

    pub fn with_page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn temporary_open(&self) -> bool {
        self.temporary.is_some() || self.contexts_opened != self.contexts_closed
    }

    pub fn was_queried(&self, selector: &str) -> bool {
        self.queried.iter().any(|s| s == selector)
    }

    fn current(&self) -> Option<&ScriptedResult> {
        self.active_result.and_then(|i| self.results.get(i))
    }

    fn lookup(&mut self, selector: &str) -> Option<ElementSnapshot> {
        self.queried.push(selector.to_string());
        if self.temporary.is_some() {
            return None;
        }
        let result = self.current()?;
        if selector == self.selectors.primary_marker {
            result.primary.clone()
        } else if selector == self.selectors.broader_marker {
            result.broader.clone()
        } else if selector == self.selectors.source_link {
            result.source_link.as_ref().map(|href| ElementSnapshot {
                href: Some(href.clone()),
                ..Default::default()
            })
        } else {
            None
        }
    }

    fn reachable(&self, selector: &str, index: usize) -> bool {
        selector == self.selectors.thumbnail && self.results.get(index).is_some_and(|r| r.activatable)
    }
}

impl BrowsingSession for ScriptedSession {
    fn open_listing(&mut self, url: &str) -> Result<()> {
        self.listings_opened.push(url.to_string());
        if self.listing_fails_for.iter().any(|u| u == url) {
            return Err(anyhow!("navigation to {} failed", url));
        }
        self.active_result = None;
        Ok(())
    }

    fn count_results(&mut self, selector: &str, _wait: Duration) -> Result<usize> {
        Ok(if selector == self.selectors.thumbnail {
            self.results.len()
        } else {
            0
        })
    }

    fn scroll_result_into_view(&mut self, selector: &str, index: usize) -> Result<bool> {
        Ok(self.reachable(selector, index))
    }

    fn click_result(&mut self, selector: &str, index: usize) -> Result<bool> {
        if !self.reachable(selector, index) || self.results[index].click_fails {
            return Ok(false);
        }
        self.active_result = Some(index);
        Ok(true)
    }

    fn wait_for_element(&mut self, selector: &str, _wait: Duration) -> Result<Option<ElementSnapshot>> {
        Ok(self.lookup(selector))
    }

    fn find_element(&mut self, selector: &str) -> Result<Option<ElementSnapshot>> {
        Ok(self.lookup(selector))
    }

    fn open_temporary_context(&mut self) -> Result<()> {
        if self.temporary.is_some() {
            return Err(anyhow!("temporary context already open"));
        }
        self.contexts_opened += 1;
        self.temporary = Some(String::new());
        Ok(())
    }

    fn load_page(&mut self, url: &str, _wait: Duration) -> Result<bool> {
        self.pages_loaded.push(url.to_string());
        self.temporary = Some(url.to_string());
        Ok(self.pages.get(url).is_some_and(|p| p.loads))
    }

    fn snapshot_images(&mut self) -> Result<Vec<ImageSnapshot>> {
        let url = self.temporary.clone().unwrap_or_default();
        match self.pages.get(&url) {
            Some(page) if page.crashes => Err(anyhow!("tab crashed while reading {}", url)),
            Some(page) => Ok(page.images.clone()),
            None => Ok(Vec::new()),
        }
    }

    fn close_temporary_context(&mut self) -> Result<()> {
        if self.temporary.take().is_some() {
            self.contexts_closed += 1;
        }
        Ok(())
    }
}
