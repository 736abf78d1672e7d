//! The browser capabilities the watcher needs, and nothing about how a
//! browser is obtained.
//!
//! [`Page`] is the seam: navigation, waits, element queries, script
//! evaluation, property reads, clicks and value assignment. [`WebDriverPage`]
//! drives a real session; [`mock::ScriptedPage`] serves in-memory documents.

pub mod mock;
pub mod probe;
pub mod scripts;
pub mod webdriver;

pub use probe::{ProbeList, ProbeStrategy, Requirement};
pub use webdriver::WebDriverPage;

use serde_json::Value;
use std::fmt;
use std::time::Duration;

// ── Locators & handles ──

/// How to find an element: CSS selector or XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css({s})"),
            Locator::XPath(s) => write!(f, "xpath({s})"),
        }
    }
}

/// Opaque reference to an element found on the current document.
/// Handles go stale after navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Argument passed into an in-page script (`arguments[i]`).
#[derive(Debug, Clone)]
pub enum ScriptArg {
    Element(ElementHandle),
    Value(Value),
}

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("could not open a webdriver session at {url}: {message}")]
    Connect { url: String, message: String },
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("webdriver command failed: {0}")]
    WebDriver(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("element {0} is no longer attached to the page")]
    StaleElement(String),
}

// ── Page seam ──

/// A live, navigable page. One page is shared by the whole agent and used
/// strictly sequentially.
#[async_trait::async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait for the document to load.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Wait up to `timeout` for a matching element. `Ok(None)` on timeout.
    async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, BrowserError>;

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError>;

    /// DOM property (not attribute), e.g. `href` resolves to an absolute URL.
    async fn property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Run a script body in the page; `arguments[i]` maps to `args[i]`.
    async fn evaluate(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value, BrowserError>;

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Assign `value` and dispatch bubbling `input` and `change` events.
    async fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), BrowserError>;
}

// ── Element helpers ──

pub async fn is_visible(page: &dyn Page, element: &ElementHandle) -> Result<bool, BrowserError> {
    let v = page
        .evaluate(scripts::IS_VISIBLE, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(v.as_bool().unwrap_or(false))
}

/// Visible and not disabled.
pub async fn is_clickable(page: &dyn Page, element: &ElementHandle) -> Result<bool, BrowserError> {
    let v = page
        .evaluate(scripts::IS_CLICKABLE, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(v.as_bool().unwrap_or(false))
}

pub async fn scroll_into_view(
    page: &dyn Page,
    element: &ElementHandle,
) -> Result<(), BrowserError> {
    page.evaluate(scripts::SCROLL_INTO_VIEW, vec![ScriptArg::Element(element.clone())])
        .await?;
    Ok(())
}

/// Native click; if that is rejected (overlay, interception) fall back to a
/// programmatic `element.click()`.
pub async fn click_with_fallback(
    page: &dyn Page,
    element: &ElementHandle,
) -> Result<(), BrowserError> {
    match page.click(element).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %e, "native click rejected, using script click");
            page.evaluate(scripts::CLICK, vec![ScriptArg::Element(element.clone())])
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_display() {
        assert_eq!(Locator::css("a.next").to_string(), "css(a.next)");
        assert_eq!(Locator::xpath("//a").to_string(), "xpath(//a)");
        assert_eq!(Locator::xpath("//a").as_str(), "//a");
    }

    #[test]
    fn error_messages() {
        let e = BrowserError::Navigation {
            url: "https://x".into(),
            message: "timeout".into(),
        };
        assert_eq!(e.to_string(), "navigation to https://x failed: timeout");
    }
}
