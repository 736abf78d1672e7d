use serde::{Deserialize, Serialize};

/// One product card read from a listing page. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub title: String,
    /// Series / category label shown above the title.
    #[serde(default)]
    pub caption: String,
    /// Absolute link to the detail page; empty when the card has no anchor.
    #[serde(default)]
    pub href: String,
}

impl ScrapedItem {
    pub fn new(
        title: impl Into<String>,
        caption: impl Into<String>,
        href: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            caption: caption.into(),
            href: href.into(),
        }
    }

    pub fn has_link(&self) -> bool {
        !self.href.trim().is_empty()
    }
}
