//! Lazy, forward-only pagination over a product listing.

use crate::config::{pause, Pacing};
use crate::site::{Category, ListingMarkup, SiteProfile};
use restock_browser::{BrowserError, Page};
use restock_core::ScrapedItem;
use std::collections::HashSet;

/// One listing page's cards and the URL they were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub page_number: usize,
    pub items: Vec<ScrapedItem>,
    pub current_url: String,
}

/// Navigate to a category listing: the configured direct URL, or the link
/// after its heading on the home page. `Ok(None)` when the link is missing.
pub async fn open_category(
    page: &dyn Page,
    site: &SiteProfile,
    pacing: &Pacing,
    category: Category,
) -> Result<Option<String>, BrowserError> {
    if let Some(url) = site.direct_url(category) {
        page.goto(url).await?;
        return Ok(Some(url.to_string()));
    }

    page.goto(&site.home_url).await?;
    let Some(link) = page
        .wait_for(&category.entry_link(), pacing.entry_link_timeout)
        .await?
    else {
        tracing::warn!(heading = category.heading(), "category link not found, skipping");
        return Ok(None);
    };
    let href = page.property(&link, "href").await?.unwrap_or_default();
    if href.trim().is_empty() {
        tracing::warn!(heading = category.heading(), "category link has no href, skipping");
        return Ok(None);
    }
    tracing::info!(heading = category.heading(), url = %href, "opening category");
    page.goto(&href).await?;
    Ok(Some(href))
}

enum Position {
    /// The first page is whatever is loaded now.
    Start,
    /// Last page read; the next pull looks for its next-page link.
    At(String),
    Done,
}

/// Pulls pages one at a time starting from the page currently loaded.
///
/// Ends when the listing container does not render, no next-page control is
/// visible, or the next URL is empty, the current one, or already visited.
/// A fresh walker is needed for a fresh walk.
pub struct ListingWalker<'a> {
    page: &'a dyn Page,
    markup: &'a ListingMarkup,
    pacing: &'a Pacing,
    visited: HashSet<String>,
    page_number: usize,
    position: Position,
}

impl<'a> ListingWalker<'a> {
    pub fn new(page: &'a dyn Page, markup: &'a ListingMarkup, pacing: &'a Pacing) -> Self {
        Self {
            page,
            markup,
            pacing,
            visited: HashSet::new(),
            page_number: 0,
            position: Position::Start,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<PageResult>, BrowserError> {
        match std::mem::replace(&mut self.position, Position::Done) {
            Position::Done => Ok(None),
            Position::Start => {
                let url = self.page.current_url().await?;
                self.visited.insert(url);
                self.read_current().await
            }
            Position::At(last_url) => {
                let Some(next_url) = self.next_url(&last_url).await? else {
                    return Ok(None);
                };
                pause(self.pacing.jitter()).await;
                if let Err(e) = self.page.goto(&next_url).await {
                    tracing::warn!(
                        url = %next_url,
                        error = %e,
                        "next page failed to load, ending walk"
                    );
                    return Ok(None);
                }
                self.visited.insert(next_url);
                self.read_current().await
            }
        }
    }

    async fn read_current(&mut self) -> Result<Option<PageResult>, BrowserError> {
        self.page_number += 1;
        if self
            .page
            .wait_for(&self.markup.container, self.pacing.listing_timeout)
            .await?
            .is_none()
        {
            tracing::info!(page = self.page_number, "no product cards, ending walk");
            return Ok(None);
        }

        let raw = self.page.evaluate(self.markup.extract_script, vec![]).await?;
        let items: Vec<ScrapedItem> = if raw.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(raw).map_err(|e| BrowserError::Script(e.to_string()))?
        };
        let current_url = self.page.current_url().await?;
        tracing::info!(page = self.page_number, items = items.len(), "listing page read");

        self.position = Position::At(current_url.clone());
        Ok(Some(PageResult {
            page_number: self.page_number,
            items,
            current_url,
        }))
    }

    /// Resolve the next page's absolute URL from the page `last_url`. The
    /// caller may have navigated elsewhere in between, so return there first.
    async fn next_url(&mut self, last_url: &str) -> Result<Option<String>, BrowserError> {
        if self.page.current_url().await? != last_url {
            self.page.goto(last_url).await?;
        }
        let Some((link, strategy)) = self.markup.next_page.first_match(self.page).await else {
            tracing::info!(page = self.page_number, "no next-page control, ending walk");
            return Ok(None);
        };
        let href = self
            .page
            .property(&link, "href")
            .await?
            .unwrap_or_default();
        if href.trim().is_empty() || href == last_url || self.visited.contains(&href) {
            tracing::info!(
                page = self.page_number,
                strategy = strategy.name,
                next = %href,
                "next page empty or already visited, ending walk"
            );
            return Ok(None);
        }
        Ok(Some(href))
    }
}
