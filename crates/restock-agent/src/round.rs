//! The round loop: scheduled tasks, restock scan, reconciliation and
//! notification, then sleep. Round state is threaded through explicitly.

use crate::config::{pause, AgentConfig, Pacing};
use crate::events::{AgentEvent, EventLogger};
use crate::matcher::process_page;
use crate::purchase::Purchaser;
use crate::scheduled::run_due_tasks;
use crate::site::{Category, SiteProfile};
use crate::state::StateView;
use crate::walker::{open_category, ListingWalker};
use chrono::NaiveDate;
use restock_browser::Page;
use restock_core::clock::now_local;
use restock_core::{ListedItem, RoundSnapshot};
use restock_notify::{compose, Notifier};
use restock_store::StateStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Carried from one round to the next.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub previous_snapshot: RoundSnapshot,
    pub last_notified_day: Option<NaiveDate>,
}

/// The diff between this round's listing and the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub new_items: Vec<ListedItem>,
    pub first_run_of_day: bool,
}

impl Reconciliation {
    pub fn should_notify(&self) -> bool {
        self.first_run_of_day || !self.new_items.is_empty()
    }
}

/// Titles in `current` absent from the previous round, and whether no
/// notification has gone out yet `today`.
pub fn reconcile(current: &RoundSnapshot, state: &RoundState, today: NaiveDate) -> Reconciliation {
    Reconciliation {
        new_items: current.new_since(&state.previous_snapshot),
        first_run_of_day: state.last_notified_day != Some(today),
    }
}

/// Everything a round needs. One page, used strictly sequentially.
pub struct Agent {
    pub page: Arc<dyn Page>,
    pub purchaser: Arc<dyn Purchaser>,
    pub notifier: Arc<dyn Notifier>,
    pub store: StateStore,
    pub events: EventLogger,
    pub site: SiteProfile,
    pub pacing: Pacing,
    pub max_purchase_attempts: u32,
}

impl Agent {
    pub fn new(
        config: &AgentConfig,
        page: Arc<dyn Page>,
        purchaser: Arc<dyn Purchaser>,
        notifier: Arc<dyn Notifier>,
        store: StateStore,
        events: EventLogger,
    ) -> Self {
        Self {
            page,
            purchaser,
            notifier,
            store,
            events,
            site: SiteProfile::from_config(config),
            pacing: config.pacing(),
            max_purchase_attempts: config.max_purchase_attempts.max(1),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// One full round. Scan-level errors propagate; the caller decides
    /// whether to retry.
    pub async fn run_round(&self, state: &RoundState) -> anyhow::Result<RoundState> {
        let now = now_local();
        let today = now.date();

        run_due_tasks(self, now).await;

        let page = self.page.as_ref();
        if open_category(page, &self.site, &self.pacing, Category::Restock)
            .await?
            .is_none()
        {
            return Ok(state.clone());
        }

        let view = StateView(&self.store);
        let targets = view.targets();
        tracing::info!(targets = targets.len(), "scan started");
        self.events.emit(AgentEvent::NewRound);

        let mut snapshot = RoundSnapshot::new();
        let mut walker = ListingWalker::new(page, &self.site.listing, &self.pacing);
        while let Some(listing) = walker.next_page().await? {
            process_page(self, &targets, today, &listing, &mut snapshot).await;
        }

        let diff = reconcile(&snapshot, state, today);
        tracing::info!(
            total = snapshot.len(),
            new = diff.new_items.len(),
            first_of_day = diff.first_run_of_day,
            "round summary"
        );

        let mut last_notified_day = state.last_notified_day;
        if diff.should_notify() {
            let history = view.history(today);
            let mail = view.mail();
            let notification = compose(
                &snapshot,
                &diff.new_items,
                &history,
                diff.first_run_of_day,
                now_local(),
                mail.as_ref(),
            );
            if let Err(e) = self.notifier.notify(&notification).await {
                tracing::warn!(error = format!("{e:#}"), "notification failed");
            }
            last_notified_day = Some(today);
        } else {
            tracing::info!("no new items, notification skipped");
        }

        Ok(RoundState {
            previous_snapshot: snapshot,
            last_notified_day,
        })
    }

    /// Run rounds until `cancel` fires. A failed round is logged and retried
    /// after the recovery interval; an in-flight round is never interrupted.
    pub async fn run_forever(&self, cancel: CancellationToken) {
        let mut state = RoundState::default();
        let mut round: u64 = 0;
        while !cancel.is_cancelled() {
            round += 1;
            tracing::info!(round, "round starting");
            let delay = match self.run_round(&state).await {
                Ok(next) => {
                    state = next;
                    self.pacing.round_interval
                }
                Err(e) => {
                    tracing::error!(round, error = format!("{e:#}"), "round failed, recovering");
                    self.pacing.recovery_interval
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = pause(delay) => {}
            }
        }
        tracing::info!(rounds = round, "agent stopped");
    }
}
