//! Store reads that never fail the round: unreadable state is logged and
//! treated as empty.

use chrono::NaiveDate;
use restock_core::{DailyHistory, ScheduledTask, Target};
use restock_store::{MailConfig, StateStore};

pub struct StateView<'a>(pub &'a StateStore);

impl StateView<'_> {
    pub fn targets(&self) -> Vec<Target> {
        self.0.load_targets().unwrap_or_else(|e| {
            tracing::warn!(error = format!("{e:#}"), "targets unreadable, watching nothing");
            Vec::new()
        })
    }

    pub fn tasks(&self) -> Vec<ScheduledTask> {
        self.0.load_tasks().unwrap_or_else(|e| {
            tracing::warn!(
                error = format!("{e:#}"),
                "scheduled tasks unreadable, treating as none"
            );
            Vec::new()
        })
    }

    pub fn history(&self, today: NaiveDate) -> DailyHistory {
        self.0.load_history(today).unwrap_or_else(|e| {
            tracing::warn!(error = format!("{e:#}"), "history unreadable, treating as empty");
            DailyHistory::empty(today)
        })
    }

    pub fn mail(&self) -> Option<MailConfig> {
        self.0.load_mail_config().unwrap_or_else(|e| {
            tracing::warn!(error = format!("{e:#}"), "mail config unreadable");
            None
        })
    }
}
