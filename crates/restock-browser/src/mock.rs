//! Scripted in-memory page for tests.
//!
//! Each URL maps to a [`MockDocument`] of elements (matched by exact
//! locator) and canned script results. Navigation, clicks and value
//! assignments are logged as [`PageAction`]s for assertions.

use crate::{scripts, BrowserError, ElementHandle, Locator, Page, ScriptArg};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockElement {
    pub locator: Locator,
    pub props: HashMap<String, String>,
    pub visible: bool,
    pub enabled: bool,
    pub navigates_to: Option<String>,
    pub rejects_native_click: bool,
}

impl MockElement {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            props: HashMap::new(),
            visible: true,
            enabled: true,
            navigates_to: None,
            rejects_native_click: false,
        }
    }

    pub fn prop(mut self, name: &str, value: &str) -> Self {
        self.props.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Clicking this element loads `url`.
    pub fn navigates_to(mut self, url: &str) -> Self {
        self.navigates_to = Some(url.to_string());
        self
    }

    /// Native clicks fail as if intercepted; script clicks still work.
    pub fn rejects_native_click(mut self) -> Self {
        self.rejects_native_click = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockDocument {
    elements: Vec<MockElement>,
    scripts: HashMap<String, Value>,
}

impl MockDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Result returned when exactly `script` is evaluated on this document.
    pub fn script(mut self, script: &str, result: Value) -> Self {
        self.scripts.insert(script.to_string(), result);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Goto(String),
    Click(Locator),
    ScriptClick(Locator),
    SetValue(Locator, String),
}

#[derive(Debug, Default)]
struct MockState {
    documents: HashMap<String, MockDocument>,
    failing: HashSet<String>,
    current_url: String,
    generation: u64,
    handles: Vec<HandleEntry>,
    actions: Vec<PageAction>,
}

#[derive(Debug, Clone)]
struct HandleEntry {
    url: String,
    index: usize,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct ScriptedPage {
    state: Mutex<MockState>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the document served at `url`.
    pub fn add_document(&self, url: &str, document: MockDocument) {
        self.lock().documents.insert(url.to_string(), document);
    }

    /// Make every navigation to `url` fail.
    pub fn fail_navigation(&self, url: &str) {
        self.lock().failing.insert(url.to_string());
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.lock().actions.clone()
    }

    pub fn visits(&self, url: &str) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| matches!(a, PageAction::Goto(u) if u == url))
            .count()
    }

    pub fn clicks(&self, locator: &Locator) -> usize {
        self.lock()
            .actions
            .iter()
            .filter(|a| {
                matches!(a, PageAction::Click(l) | PageAction::ScriptClick(l) if l == locator)
            })
            .count()
    }

    pub fn values_set(&self) -> Vec<(Locator, String)> {
        self.lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                PageAction::SetValue(l, v) => Some((l.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a test already panicked.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl MockState {
    fn navigate(&mut self, url: &str) {
        self.current_url = url.to_string();
        self.generation += 1;
    }

    fn matching(&self, locator: &Locator) -> Vec<usize> {
        self.documents
            .get(&self.current_url)
            .map(|doc| {
                doc.elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| &e.locator == locator)
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn issue(&mut self, index: usize) -> ElementHandle {
        self.handles.push(HandleEntry {
            url: self.current_url.clone(),
            index,
            generation: self.generation,
        });
        ElementHandle::new(format!("mock-{}", self.handles.len() - 1))
    }

    fn resolve(&self, handle: &ElementHandle) -> Result<MockElement, BrowserError> {
        let stale = || BrowserError::StaleElement(handle.id().to_string());
        let slot: usize = handle
            .id()
            .strip_prefix("mock-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(stale)?;
        let entry = self.handles.get(slot).ok_or_else(stale)?;
        if entry.generation != self.generation {
            return Err(stale());
        }
        self.documents
            .get(&entry.url)
            .and_then(|doc| doc.elements.get(entry.index))
            .cloned()
            .ok_or_else(stale)
    }

    fn perform_click(&mut self, element: &MockElement, scripted: bool) {
        self.actions.push(if scripted {
            PageAction::ScriptClick(element.locator.clone())
        } else {
            PageAction::Click(element.locator.clone())
        });
        if let Some(url) = &element.navigates_to {
            self.navigate(url);
        }
    }
}

fn element_arg(args: &[ScriptArg]) -> Result<&ElementHandle, BrowserError> {
    match args.first() {
        Some(ScriptArg::Element(h)) => Ok(h),
        _ => Err(BrowserError::Script("expected an element argument".into())),
    }
}

#[async_trait::async_trait]
impl Page for ScriptedPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        state.actions.push(PageAction::Goto(url.to_string()));
        if state.failing.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "scripted failure".into(),
            });
        }
        state.navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.lock().current_url.clone())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let mut state = self.lock();
        let first = state.matching(locator).first().copied();
        Ok(first.map(|i| state.issue(i)))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError> {
        let mut state = self.lock();
        let found = state.matching(locator);
        Ok(found.into_iter().map(|i| state.issue(i)).collect())
    }

    async fn property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let state = self.lock();
        Ok(state.resolve(element)?.props.get(name).cloned())
    }

    async fn evaluate(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value, BrowserError> {
        let mut state = self.lock();
        match script {
            scripts::IS_VISIBLE => {
                let el = state.resolve(element_arg(&args)?)?;
                Ok(Value::Bool(el.visible))
            }
            scripts::IS_CLICKABLE => {
                let el = state.resolve(element_arg(&args)?)?;
                Ok(Value::Bool(el.visible && el.enabled))
            }
            scripts::SCROLL_INTO_VIEW => {
                state.resolve(element_arg(&args)?)?;
                Ok(Value::Null)
            }
            scripts::CLICK => {
                let el = state.resolve(element_arg(&args)?)?;
                state.perform_click(&el, true);
                Ok(Value::Null)
            }
            other => Ok(state
                .documents
                .get(&state.current_url)
                .and_then(|doc| doc.scripts.get(other))
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let mut state = self.lock();
        let el = state.resolve(element)?;
        if el.rejects_native_click {
            return Err(BrowserError::WebDriver("element click intercepted".into()));
        }
        state.perform_click(&el, false);
        Ok(())
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        let el = state.resolve(element)?;
        state
            .actions
            .push(PageAction::SetValue(el.locator.clone(), value.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::click_with_fallback;
    use serde_json::json;

    #[tokio::test]
    async fn handles_go_stale_after_navigation() {
        let page = ScriptedPage::new();
        page.add_document(
            "https://a",
            MockDocument::new().element(MockElement::new(Locator::css("#x"))),
        );
        page.goto("https://a").await.unwrap();
        let el = page.find_all(&Locator::css("#x")).await.unwrap().remove(0);
        page.goto("https://b").await.unwrap();
        assert!(matches!(
            page.property(&el, "href").await,
            Err(BrowserError::StaleElement(_))
        ));
    }

    #[tokio::test]
    async fn click_follows_navigation_and_fallback_uses_script() {
        let page = ScriptedPage::new();
        let button = Locator::css("button.buy");
        page.add_document(
            "https://a",
            MockDocument::new().element(
                MockElement::new(button.clone())
                    .navigates_to("https://done")
                    .rejects_native_click(),
            ),
        );
        page.goto("https://a").await.unwrap();
        let el = page.wait_for(&button, Duration::ZERO).await.unwrap().unwrap();
        assert!(page.click(&el).await.is_err());
        click_with_fallback(&page, &el).await.unwrap();
        assert_eq!(page.current_url().await.unwrap(), "https://done");
        assert_eq!(page.clicks(&button), 1);
    }

    #[tokio::test]
    async fn canned_scripts_and_unknown_documents() {
        let page = ScriptedPage::new();
        page.add_document(
            "https://a",
            MockDocument::new().script("return 1;", json!(1)),
        );
        page.goto("https://a").await.unwrap();
        assert_eq!(page.evaluate("return 1;", vec![]).await.unwrap(), json!(1));
        assert_eq!(page.evaluate("return 2;", vec![]).await.unwrap(), Value::Null);

        page.goto("https://unknown").await.unwrap();
        assert!(page
            .wait_for(&Locator::css("a"), Duration::ZERO)
            .await
            .unwrap()
            .is_none());
        assert_eq!(page.visits("https://a"), 1);
    }

    #[tokio::test]
    async fn failing_navigation_is_logged_and_reported() {
        let page = ScriptedPage::new();
        page.fail_navigation("https://down");
        assert!(page.goto("https://down").await.is_err());
        assert_eq!(page.visits("https://down"), 1);
    }
}
