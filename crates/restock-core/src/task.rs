use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::clock::DAY_FORMAT;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

/// A time-gated, quantity-targeted purchase instruction.
///
/// `product_name` is matched as a substring of listing titles, since
/// new-arrival titles often carry variant suffixes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub id: String,
    pub product_name: String,
    /// `YYYY-MM-DD`, local time.
    pub target_date: String,
    /// `HH:MM`, local time.
    pub target_time: String,
    pub target_quantity: u32,
    #[serde(default)]
    pub fulfilled_quantity: u32,
    #[serde(default)]
    pub status: TaskStatus,
}

impl ScheduledTask {
    pub fn new(
        id: impl Into<String>,
        product_name: impl Into<String>,
        target_date: impl Into<String>,
        target_time: impl Into<String>,
        target_quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            product_name: product_name.into(),
            target_date: target_date.into(),
            target_time: target_time.into(),
            target_quantity,
            fulfilled_quantity: 0,
            status: TaskStatus::Pending,
        }
    }

    /// Local moment the task becomes eligible. `None` if date or time is malformed.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.target_date.trim(), DAY_FORMAT).ok()?;
        let time_str = self.target_time.trim();
        let time = NaiveTime::parse_from_str(time_str, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M:%S"))
            .ok()?;
        Some(date.and_time(time))
    }

    pub fn is_terminal(&self) -> bool {
        self.status == TaskStatus::Completed || self.fulfilled_quantity >= self.target_quantity
    }

    /// Not terminal and its scheduled moment is at or before `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        !self.is_terminal() && self.due_at().is_some_and(|at| at <= now)
    }

    pub fn remaining(&self) -> u32 {
        self.target_quantity.saturating_sub(self.fulfilled_quantity)
    }

    /// Substring match of `product_name` against a listing title.
    pub fn matches_title(&self, title: &str) -> bool {
        let needle = self.product_name.trim();
        !needle.is_empty() && title.contains(needle)
    }

    /// Add secured units; flips to `Completed` once the target is met.
    pub fn record_fulfilled(&mut self, quantity: u32) {
        self.fulfilled_quantity = self.fulfilled_quantity.saturating_add(quantity);
        if self.fulfilled_quantity >= self.target_quantity {
            self.status = TaskStatus::Completed;
        }
    }
}
