//! Storefront markup: entry links, listing cards, pagination and the
//! purchase controls, each as ordered probe strategies where the markup is
//! inconsistent.

use crate::config::AgentConfig;
use restock_browser::{Locator, ProbeList, ProbeStrategy, Requirement};

/// A listing reached from a heading on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Restock,
    NewArrivals,
}

impl Category {
    pub fn heading(self) -> &'static str {
        match self {
            Category::Restock => "再入荷アイテム",
            Category::NewArrivals => "新着アイテム",
        }
    }

    /// The anchor that follows the section heading.
    pub fn entry_link(self) -> Locator {
        Locator::xpath(format!(
            "//h2[contains(text(), \"{}\")]/following-sibling::a",
            self.heading()
        ))
    }
}

/// Returns `[{title, caption, href}]` for every complete card on the page.
pub const EXTRACT_CARDS: &str = "const items = []; \
document.querySelectorAll('.card-information__wrapper').forEach(w => { \
  const captionEl = w.querySelector('.caption-with-letter-spacing.light'); \
  const titleEl = w.querySelector('.card-information__text.h5'); \
  if (captionEl && titleEl) { \
    const link = w.closest('a'); \
    items.push({ \
      caption: captionEl.innerText.trim(), \
      title: titleEl.innerText.trim(), \
      href: link ? link.href : '' \
    }); \
  } \
}); \
return items;";

#[derive(Debug, Clone)]
pub struct ListingMarkup {
    pub container: Locator,
    pub extract_script: &'static str,
    pub next_page: ProbeList,
}

#[derive(Debug, Clone)]
pub struct CheckoutMarkup {
    pub quantity_input: Locator,
    pub add_to_cart: ProbeList,
    pub checkout_button: Locator,
    pub payment_confirmed: Locator,
}

#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub home_url: String,
    pub restock_url: Option<String>,
    pub new_arrivals_url: Option<String>,
    pub cart_url: String,
    pub listing: ListingMarkup,
    pub checkout: CheckoutMarkup,
}

impl SiteProfile {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            home_url: config.home_url.clone(),
            restock_url: config.restock_url.clone(),
            new_arrivals_url: config.new_arrivals_url.clone(),
            cart_url: config.cart_url.clone(),
            listing: ListingMarkup {
                container: Locator::css(".card-information__wrapper"),
                extract_script: EXTRACT_CARDS,
                next_page: ProbeList::new(
                    Requirement::Visible,
                    vec![
                        ProbeStrategy::css("aria-label", "a[aria-label=\"次のページ\"]"),
                        ProbeStrategy::xpath(
                            "aria-label-xpath",
                            "//a[@aria-label=\"次のページ\"]",
                        ),
                        ProbeStrategy::xpath("link-text", "//a[contains(text(), \"次へ\")]"),
                    ],
                ),
            },
            checkout: CheckoutMarkup {
                quantity_input: Locator::css("input[name=\"quantity\"]"),
                add_to_cart: ProbeList::new(
                    Requirement::Clickable,
                    vec![
                        ProbeStrategy::css(
                            "submit-button",
                            "button.product-form__submit[type=\"button\"]",
                        ),
                        ProbeStrategy::css(
                            "submit-unhidden",
                            "button.product-form__submit:not([hidden])",
                        ),
                        ProbeStrategy::xpath(
                            "button-text",
                            "//button[contains(text(), \"カートに追加\")]",
                        ),
                        ProbeStrategy::css("add-name", "button[name=\"add\"]"),
                    ],
                ),
                checkout_button: Locator::css("button[name=\"checkout\"], #checkout"),
                payment_confirmed: Locator::css(".os-header__title, [data-step=\"thank_you\"]"),
            },
        }
    }

    /// Configured direct URL for a category, if any.
    pub fn direct_url(&self, category: Category) -> Option<&str> {
        let url = match category {
            Category::Restock => self.restock_url.as_deref(),
            Category::NewArrivals => self.new_arrivals_url.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}
