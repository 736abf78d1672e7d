//! Ordered locator strategies. Each strategy is tried in turn and the first
//! element that satisfies the requirement wins; a failing strategy is skipped.

use crate::{is_clickable, is_visible, ElementHandle, Locator, Page};

/// What a candidate element must satisfy to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Visible,
    Clickable,
}

#[derive(Debug, Clone)]
pub struct ProbeStrategy {
    pub name: &'static str,
    pub locator: Locator,
}

impl ProbeStrategy {
    pub fn css(name: &'static str, selector: &str) -> Self {
        Self {
            name,
            locator: Locator::css(selector),
        }
    }

    pub fn xpath(name: &'static str, expr: &str) -> Self {
        Self {
            name,
            locator: Locator::xpath(expr),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeList {
    strategies: Vec<ProbeStrategy>,
    requirement: Requirement,
}

impl ProbeList {
    pub fn new(requirement: Requirement, strategies: Vec<ProbeStrategy>) -> Self {
        Self {
            strategies,
            requirement,
        }
    }

    pub fn strategies(&self) -> &[ProbeStrategy] {
        &self.strategies
    }

    /// First element, across strategies in order, that meets the requirement.
    pub async fn first_match(&self, page: &dyn Page) -> Option<(ElementHandle, &ProbeStrategy)> {
        for strategy in &self.strategies {
            let found = match page.find_all(&strategy.locator).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(strategy = strategy.name, error = %e, "probe failed");
                    continue;
                }
            };
            for element in found {
                if self.accepts(page, &element).await {
                    tracing::debug!(strategy = strategy.name, "probe matched");
                    return Some((element, strategy));
                }
            }
        }
        None
    }

    async fn accepts(&self, page: &dyn Page, element: &ElementHandle) -> bool {
        let checked = match self.requirement {
            Requirement::Visible => is_visible(page, element).await,
            Requirement::Clickable => is_clickable(page, element).await,
        };
        checked.unwrap_or(false)
    }
}
