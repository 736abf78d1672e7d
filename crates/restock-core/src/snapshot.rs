use std::collections::HashMap;

use serde::Serialize;

/// Title + caption pair as shown on the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedItem {
    pub title: String,
    pub caption: String,
}

/// Everything seen during one full walk of the restock listing, keyed by
/// title, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSnapshot {
    items: Vec<ListedItem>,
    index: HashMap<String, usize>,
}

impl RoundSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repeated title keeps its first position and takes the latest caption.
    pub fn insert(&mut self, title: impl Into<String>, caption: impl Into<String>) {
        let title = title.into();
        let caption = caption.into();
        match self.index.get(&title) {
            Some(&i) => self.items[i].caption = caption,
            None => {
                self.index.insert(title.clone(), self.items.len());
                self.items.push(ListedItem { title, caption });
            }
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn caption(&self, title: &str) -> Option<&str> {
        self.index.get(title).map(|&i| self.items[i].caption.as_str())
    }

    pub fn items(&self) -> &[ListedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose title is absent from `previous`. Caption changes on a
    /// known title do not count as new.
    pub fn new_since(&self, previous: &RoundSnapshot) -> Vec<ListedItem> {
        self.items
            .iter()
            .filter(|item| !previous.contains(&item.title))
            .cloned()
            .collect()
    }
}

impl<T: Into<String>, C: Into<String>> FromIterator<(T, C)> for RoundSnapshot {
    fn from_iter<I: IntoIterator<Item = (T, C)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (title, caption) in iter {
            snapshot.insert(title, caption);
        }
        snapshot
    }
}
