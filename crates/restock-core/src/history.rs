use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::day_key;

/// One purchase recorded for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HistoryRecord", rename_all = "camelCase")]
pub struct HistoryEntry {
    pub title: String,
    pub caption: String,
    pub quantity: u32,
    /// Local timestamp of the purchase, free-form for display.
    pub matched_at: String,
}

/// Older history files stored bare title strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryRecord {
    Title(String),
    Entry {
        title: String,
        #[serde(default)]
        caption: String,
        #[serde(default = "default_quantity")]
        quantity: u32,
        #[serde(default, rename = "matchedAt")]
        matched_at: String,
    },
}

fn default_quantity() -> u32 {
    1
}

impl From<HistoryRecord> for HistoryEntry {
    fn from(record: HistoryRecord) -> Self {
        match record {
            HistoryRecord::Title(title) => Self {
                title,
                caption: String::new(),
                quantity: 1,
                matched_at: String::new(),
            },
            HistoryRecord::Entry {
                title,
                caption,
                quantity,
                matched_at,
            } => Self {
                title,
                caption,
                quantity,
                matched_at,
            },
        }
    }
}

impl HistoryEntry {
    pub fn new(
        title: impl Into<String>,
        caption: impl Into<String>,
        quantity: u32,
        matched_at: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            caption: caption.into(),
            quantity,
            matched_at: matched_at.into(),
        }
    }
}

/// Purchases made on one local calendar day. A title appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHistory {
    pub date: String,
    #[serde(default)]
    pub items: Vec<HistoryEntry>,
}

impl DailyHistory {
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            date: day_key(today),
            items: Vec::new(),
        }
    }

    /// Keep the history only if it belongs to `today`; any other date starts
    /// a fresh, empty day.
    pub fn for_day(self, today: NaiveDate) -> Self {
        if self.date == day_key(today) {
            self
        } else {
            Self::empty(today)
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.items.iter().any(|e| e.title == title)
    }

    pub fn get(&self, title: &str) -> Option<&HistoryEntry> {
        self.items.iter().find(|e| e.title == title)
    }

    /// Insert a purchase. An existing entry for the same title absorbs the
    /// quantity instead of being duplicated.
    pub fn record(&mut self, entry: HistoryEntry) {
        match self.items.iter_mut().find(|e| e.title == entry.title) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
                existing.matched_at = entry.matched_at;
                if existing.caption.is_empty() {
                    existing.caption = entry.caption;
                }
            }
            None => self.items.push(entry),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn yesterday_resets_to_empty() {
        let mut h = DailyHistory::empty(day(2026, 10, 18));
        h.record(HistoryEntry::new("Figure A", "IP", 2, "2026-10-18 23:59:00"));

        let today = h.for_day(day(2026, 10, 19));
        assert_eq!(today.date, "2026-10-19");
        assert!(today.is_empty());
        assert!(!today.contains("Figure A"));
    }

    #[test]
    fn same_day_is_kept() {
        let mut h = DailyHistory::empty(day(2026, 10, 19));
        h.record(HistoryEntry::new("Figure A", "IP", 2, "09:00"));
        let h = h.for_day(day(2026, 10, 19));
        assert!(h.contains("Figure A"));
    }

    #[test]
    fn record_keeps_one_entry_per_title() {
        let mut h = DailyHistory::empty(day(2026, 10, 19));
        h.record(HistoryEntry::new("Figure A", "IP", 1, "09:00"));
        h.record(HistoryEntry::new("Figure A", "IP", 2, "09:05"));
        assert_eq!(h.len(), 1);
        let e = h.get("Figure A").unwrap();
        assert_eq!(e.quantity, 3);
        assert_eq!(e.matched_at, "09:05");
    }

    #[test]
    fn legacy_string_items_load() {
        let json = r#"{"date":"2026-10-19","items":[
            "Figure A",
            {"title":"Figure B","caption":"IP","quantity":2,"matchedAt":"x"}
        ]}"#;
        let h: DailyHistory = serde_json::from_str(json).unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.items[0].quantity, 1);
        assert_eq!(h.items[1].caption, "IP");
        assert_eq!(h.items[1].matched_at, "x");
    }

    #[test]
    fn serialises_camel_case() {
        let mut h = DailyHistory::empty(day(2026, 10, 19));
        h.record(HistoryEntry::new("Figure A", "IP", 2, "t"));
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v["date"], "2026-10-19");
        assert_eq!(v["items"][0]["matchedAt"], "t");
        assert_eq!(v["items"][0]["quantity"], 2);
    }
}
