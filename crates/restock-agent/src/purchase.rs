//! One add-to-cart + checkout transaction, and the bounded loop callers use
//! to accumulate quantity across transactions.

use crate::config::{pause, Pacing};
use crate::site::CheckoutMarkup;
use restock_browser::{click_with_fallback, scroll_into_view, BrowserError, Page};
use restock_core::{DesiredQuantity, PurchaseOutcome};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("no clickable add-to-cart control on {url}")]
    NoAddToCartControl { url: String },
    #[error("no checkout control on the cart page")]
    NoCheckoutControl,
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// A single purchase attempt. No internal retries.
#[async_trait::async_trait]
pub trait Purchaser: Send + Sync {
    async fn purchase(
        &self,
        detail_link: &str,
        desired: DesiredQuantity,
    ) -> Result<PurchaseOutcome, PurchaseError>;
}

/// Drives the storefront's detail page, cart and checkout in the browser.
pub struct PurchaseFlow {
    page: Arc<dyn Page>,
    markup: CheckoutMarkup,
    cart_url: String,
    pacing: Pacing,
}

impl PurchaseFlow {
    pub fn new(
        page: Arc<dyn Page>,
        markup: CheckoutMarkup,
        cart_url: String,
        pacing: Pacing,
    ) -> Self {
        Self {
            page,
            markup,
            cart_url,
            pacing,
        }
    }

    /// Set the quantity control to the desired amount clamped to its `max`.
    /// Without a control the page's implicit quantity of 1 applies.
    async fn negotiate_quantity(&self, desired: DesiredQuantity) -> Result<u32, BrowserError> {
        let page = self.page.as_ref();
        let Some(input) = page
            .wait_for(&self.markup.quantity_input, self.pacing.quantity_timeout)
            .await?
        else {
            tracing::info!("no quantity control, buying 1");
            return Ok(1);
        };
        let max = page
            .property(&input, "max")
            .await?
            .and_then(|m| m.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let quantity = desired.clamp_to(max);
        page.set_value(&input, &quantity.to_string()).await?;
        tracing::info!(max, quantity, "quantity set");
        Ok(quantity)
    }

    async fn add_to_cart(&self, detail_link: &str) -> Result<(), PurchaseError> {
        let page = self.page.as_ref();
        let Some((button, strategy)) = self.markup.add_to_cart.first_match(page).await else {
            return Err(PurchaseError::NoAddToCartControl {
                url: detail_link.to_string(),
            });
        };
        scroll_into_view(page, &button).await?;
        pause(self.pacing.scroll_settle).await;
        click_with_fallback(page, &button).await?;
        pause(self.pacing.after_add_to_cart).await;
        tracing::info!(strategy = strategy.name, "added to cart");
        Ok(())
    }

    /// Start checkout from the cart and wait for the payment-confirmed marker.
    async fn checkout(&self) -> Result<bool, PurchaseError> {
        let page = self.page.as_ref();
        page.goto(&self.cart_url).await?;
        let Some(button) = page
            .wait_for(&self.markup.checkout_button, self.pacing.checkout_timeout)
            .await?
        else {
            return Err(PurchaseError::NoCheckoutControl);
        };
        click_with_fallback(page, &button).await?;
        let marker = page
            .wait_for(&self.markup.payment_confirmed, self.pacing.confirm_timeout)
            .await?;
        Ok(marker.is_some())
    }
}

#[async_trait::async_trait]
impl Purchaser for PurchaseFlow {
    async fn purchase(
        &self,
        detail_link: &str,
        desired: DesiredQuantity,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        self.page.goto(detail_link).await?;
        let quantity = self.negotiate_quantity(desired).await?;
        self.add_to_cart(detail_link).await?;
        if self.checkout().await? {
            tracing::info!(quantity, "payment confirmed");
            Ok(PurchaseOutcome::confirmed(quantity))
        } else {
            tracing::warn!(
                quantity,
                link = detail_link,
                "checkout submitted but not confirmed, needs manual confirmation"
            );
            Ok(PurchaseOutcome::unconfirmed(quantity))
        }
    }
}

// ── Accumulating loop ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Desired quantity reached (an unbounded target after one transaction).
    Fulfilled,
    /// Checkout went through without the confirmation marker.
    Unconfirmed,
    /// A confirmed transaction secured nothing.
    NothingSecured,
    AttemptLimit,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReport {
    /// Units from confirmed transactions only.
    pub secured: u32,
    pub attempts: u32,
    pub stop: StopReason,
}

/// Call `purchaser` until `desired` is met, an attempt is unconfirmed or
/// fails, or `max_attempts` is spent. `on_secured` runs after every
/// confirmed transaction with the units it secured.
pub async fn purchase_until<F>(
    purchaser: &dyn Purchaser,
    detail_link: &str,
    desired: DesiredQuantity,
    pacing: &Pacing,
    max_attempts: u32,
    mut on_secured: F,
) -> PurchaseReport
where
    F: FnMut(u32),
{
    let mut secured = 0;
    let mut attempts = 0;
    let stop = loop {
        let Some(want) = desired.remaining_after(secured) else {
            break StopReason::Fulfilled;
        };
        if attempts >= max_attempts {
            tracing::warn!(link = detail_link, attempts, "purchase attempt limit reached");
            break StopReason::AttemptLimit;
        }
        if attempts > 0 {
            pause(pacing.retry_delay).await;
        }
        attempts += 1;

        match purchaser.purchase(detail_link, want).await {
            Ok(outcome) if !outcome.confirmed => {
                tracing::warn!(link = detail_link, "needs manual confirmation, not retrying");
                break StopReason::Unconfirmed;
            }
            Ok(outcome) if outcome.quantity_secured == 0 => break StopReason::NothingSecured,
            Ok(outcome) => {
                secured += outcome.quantity_secured;
                on_secured(outcome.quantity_secured);
                if desired == DesiredQuantity::Unbounded {
                    break StopReason::Fulfilled;
                }
            }
            Err(e) => {
                tracing::error!(link = detail_link, error = %e, "purchase failed");
                break StopReason::Failed(e.to_string());
            }
        }
    };
    PurchaseReport {
        secured,
        attempts,
        stop,
    }
}

// ── Mock ──

/// Replays scripted outcomes in order and records every call. Once the
/// script is exhausted each call fails with `NoAddToCartControl`.
#[derive(Default)]
pub struct MockPurchaser {
    script: std::sync::Mutex<std::collections::VecDeque<Result<PurchaseOutcome, String>>>,
    calls: std::sync::Mutex<Vec<(String, DesiredQuantity)>>,
}

impl MockPurchaser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: impl IntoIterator<Item = PurchaseOutcome>) -> Self {
        let mock = Self::new();
        for o in outcomes {
            mock.push(Ok(o));
        }
        mock
    }

    /// `Err(message)` makes that call fail with a browser error.
    pub fn push(&self, outcome: Result<PurchaseOutcome, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
    }

    pub fn calls(&self) -> Vec<(String, DesiredQuantity)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Purchaser for MockPurchaser {
    async fn purchase(
        &self,
        detail_link: &str,
        desired: DesiredQuantity,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((detail_link.to_string(), desired));
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(PurchaseError::Browser(BrowserError::WebDriver(message))),
            None => Err(PurchaseError::NoAddToCartControl {
                url: detail_link.to_string(),
            }),
        }
    }
}
