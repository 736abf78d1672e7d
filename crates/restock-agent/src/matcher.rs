//! Per-item matching against the watch-list, same-day dedup, and the
//! purchase loop for matched items.

use crate::events::AgentEvent;
use crate::purchase::{purchase_until, PurchaseReport, StopReason};
use crate::round::Agent;
use crate::state::StateView;
use crate::walker::PageResult;
use chrono::NaiveDate;
use restock_core::clock::{display_timestamp, now_local};
use restock_core::{find_target, HistoryEntry, RoundSnapshot, ScrapedItem, Target};

/// What happened to one listed item that equals a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Already in today's history; nothing attempted.
    AlreadyBought,
    /// The card has no detail link.
    NoLink,
    Attempted(PurchaseReport),
}

/// Emit, collect and match every item of one listing page, in order.
pub async fn process_page(
    agent: &Agent,
    targets: &[Target],
    today: NaiveDate,
    listing: &PageResult,
    snapshot: &mut RoundSnapshot,
) -> Vec<(String, MatchOutcome)> {
    let mut outcomes = Vec::new();
    for (index, item) in listing.items.iter().enumerate() {
        let target = find_target(targets, &item.title);
        agent.events.emit(AgentEvent::ScrapedItem {
            date: display_timestamp(now_local()),
            caption: item.caption.clone(),
            title: item.title.clone(),
            is_target: target.is_some(),
        });
        tracing::info!(
            page = listing.page_number,
            index = index + 1,
            caption = %item.caption,
            title = %item.title,
            "listed"
        );
        snapshot.insert(item.title.clone(), item.caption.clone());

        let Some(target) = target else { continue };
        tracing::info!(title = %item.title, "target found");
        agent.events.emit(AgentEvent::MatchedItem {
            title: item.title.clone(),
            caption: item.caption.clone(),
        });
        let outcome = handle_match(agent, target, item, today, &listing.current_url).await;
        outcomes.push((item.title.clone(), outcome));
    }
    outcomes
}

async fn handle_match(
    agent: &Agent,
    target: &Target,
    item: &ScrapedItem,
    today: NaiveDate,
    listing_url: &str,
) -> MatchOutcome {
    let view = StateView(&agent.store);
    if view.history(today).contains(&item.title) {
        tracing::info!(title = %item.title, "already bought today, skipping");
        return MatchOutcome::AlreadyBought;
    }
    if !item.has_link() {
        tracing::warn!(title = %item.title, "no detail link, cannot open product");
        return MatchOutcome::NoLink;
    }

    let report = purchase_until(
        agent.purchaser.as_ref(),
        &item.href,
        target.desired(),
        &agent.pacing,
        agent.max_purchase_attempts,
        |quantity| tracing::info!(title = %item.title, quantity, "units secured"),
    )
    .await;

    if report.secured > 0 {
        record_purchase(agent, today, item, report.secured);
    } else if report.stop == StopReason::Unconfirmed {
        tracing::warn!(title = %item.title, "left for manual confirmation, not recorded");
    }

    if let Err(e) = agent.page.goto(listing_url).await {
        tracing::warn!(url = listing_url, error = %e, "could not return to listing");
    }
    MatchOutcome::Attempted(report)
}

/// Add secured units to today's history (one entry per title).
pub(crate) fn record_purchase(agent: &Agent, today: NaiveDate, item: &ScrapedItem, quantity: u32) {
    let mut history = StateView(&agent.store).history(today);
    history.record(HistoryEntry::new(
        item.title.clone(),
        item.caption.clone(),
        quantity,
        display_timestamp(now_local()),
    ));
    match agent.store.save_history(&history) {
        Ok(()) => tracing::info!(title = %item.title, quantity, "recorded to today's history"),
        Err(e) => {
            tracing::error!(title = %item.title, error = format!("{e:#}"), "history write failed")
        }
    }
}
