//! [`Page`] over a fantoccini WebDriver session.

use crate::{scripts, BrowserError, ElementHandle, Locator, Page, ScriptArg};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Elements found since the last navigation, keyed by handle id.
#[derive(Default)]
struct ElementCache {
    next: u64,
    by_id: HashMap<String, Element>,
}

pub struct WebDriverPage {
    client: Client,
    elements: Mutex<ElementCache>,
}

impl WebDriverPage {
    /// Open a session against `webdriver_url`. With `debugger_address` the
    /// driver attaches to an already running Chrome (keeping its login and
    /// cart) instead of launching a fresh profile.
    pub async fn connect(
        webdriver_url: &str,
        debugger_address: Option<&str>,
    ) -> Result<Self, BrowserError> {
        let mut caps = Map::new();
        if let Some(addr) = debugger_address {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "debuggerAddress": addr }),
            );
        }
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .map_err(|e| BrowserError::Connect {
                url: webdriver_url.to_string(),
                message: e.to_string(),
            })?;
        tracing::info!(webdriver = webdriver_url, "webdriver session opened");
        Ok(Self {
            client,
            elements: Mutex::new(ElementCache::default()),
        })
    }

    /// End the session. An attached browser stays open.
    pub async fn close(self) -> Result<(), BrowserError> {
        self.client.close().await.map_err(command_error)
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, ElementCache> {
        match self.elements.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn remember(&self, element: Element) -> ElementHandle {
        let mut cache = self.cache();
        cache.next += 1;
        let id = format!("wd-{}", cache.next);
        cache.by_id.insert(id.clone(), element);
        ElementHandle::new(id)
    }

    fn lookup(&self, handle: &ElementHandle) -> Result<Element, BrowserError> {
        self.cache()
            .by_id
            .get(handle.id())
            .cloned()
            .ok_or_else(|| BrowserError::StaleElement(handle.id().to_string()))
    }

    fn script_args(&self, args: Vec<ScriptArg>) -> Result<Vec<Value>, BrowserError> {
        args.into_iter()
            .map(|arg| match arg {
                ScriptArg::Value(v) => Ok(v),
                ScriptArg::Element(h) => serde_json::to_value(self.lookup(&h)?)
                    .map_err(|e| BrowserError::Script(e.to_string())),
            })
            .collect()
    }
}

fn wd_locator(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator {
        Locator::Css(s) => fantoccini::Locator::Css(s),
        Locator::XPath(s) => fantoccini::Locator::XPath(s),
    }
}

/// A wait that timed out or found nothing is an absent element, not an error.
fn absent_as_none<T>(result: Result<T, CmdError>) -> Result<Option<T>, BrowserError> {
    match result {
        Ok(found) => Ok(Some(found)),
        Err(CmdError::WaitTimeout) => Ok(None),
        Err(e) if e.is_no_such_element() => Ok(None),
        Err(e) => Err(command_error(e)),
    }
}

fn command_error(e: CmdError) -> BrowserError {
    BrowserError::WebDriver(e.to_string())
}

#[async_trait::async_trait]
impl Page for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.cache().by_id.clear();
        self.client
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let url = self.client.current_url().await.map_err(command_error)?;
        Ok(url.to_string())
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let waited = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(wd_locator(locator))
            .await;
        Ok(absent_as_none(waited)?.map(|el| self.remember(el)))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError> {
        let found = self
            .client
            .find_all(wd_locator(locator))
            .await
            .map_err(command_error)?;
        Ok(found.into_iter().map(|el| self.remember(el)).collect())
    }

    async fn property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let el = self.lookup(element)?;
        el.prop(name).await.map_err(command_error)
    }

    async fn evaluate(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value, BrowserError> {
        let args = self.script_args(args)?;
        self.client
            .execute(script, args)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let el = self.lookup(element)?;
        el.click().await.map_err(command_error)?;
        Ok(())
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> Result<(), BrowserError> {
        self.evaluate(
            scripts::SET_VALUE_AND_DISPATCH,
            vec![
                ScriptArg::Element(element.clone()),
                ScriptArg::Value(Value::String(value.to_string())),
            ],
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_timeout_means_absent() {
        let waited: Result<u8, CmdError> = Err(CmdError::WaitTimeout);
        assert_eq!(absent_as_none(waited).unwrap(), None);
    }

    #[test]
    fn found_element_is_kept() {
        assert_eq!(absent_as_none(Ok::<u8, CmdError>(7)).unwrap(), Some(7));
    }

    #[test]
    fn other_command_errors_propagate() {
        let waited: Result<u8, CmdError> = Err(CmdError::NotJson("<html>".to_string()));
        assert!(matches!(absent_as_none(waited), Err(BrowserError::WebDriver(_))));
    }
}
