//! Time-gated purchase tasks, run against the new-arrivals listing before
//! each restock scan.

use crate::events::AgentEvent;
use crate::matcher::record_purchase;
use crate::purchase::{purchase_until, PurchaseReport};
use crate::round::Agent;
use crate::site::Category;
use crate::state::StateView;
use crate::walker::{open_category, ListingWalker};
use chrono::{NaiveDate, NaiveDateTime};
use restock_browser::BrowserError;
use restock_core::{DesiredQuantity, ScheduledTask};

/// Tasks whose moment has passed and that still want units, in file order.
pub fn due_tasks(tasks: &[ScheduledTask], now: NaiveDateTime) -> Vec<ScheduledTask> {
    tasks.iter().filter(|t| t.is_due(now)).cloned().collect()
}

/// Run every due task, one after another. Returns how many were attempted.
pub async fn run_due_tasks(agent: &Agent, now: NaiveDateTime) -> usize {
    let due = due_tasks(&StateView(&agent.store).tasks(), now);
    if due.is_empty() {
        return 0;
    }
    tracing::info!(count = due.len(), "running due scheduled tasks");
    let today = now.date();
    for task in &due {
        match run_task(agent, task.clone(), today).await {
            Ok(Some(report)) => tracing::info!(
                task = %task.id,
                product = %task.product_name,
                secured = report.secured,
                stop = ?report.stop,
                "scheduled task attempt finished"
            ),
            Ok(None) => tracing::info!(
                task = %task.id,
                product = %task.product_name,
                "product not in new arrivals yet"
            ),
            Err(e) => tracing::error!(task = %task.id, error = %e, "scheduled task aborted"),
        }
    }
    due.len()
}

/// Walk the new-arrivals listing for the first title containing the task's
/// product name and buy until the task is fulfilled. The task is saved and
/// broadcast after every confirmed transaction.
async fn run_task(
    agent: &Agent,
    mut task: ScheduledTask,
    today: NaiveDate,
) -> Result<Option<PurchaseReport>, BrowserError> {
    let page = agent.page.as_ref();
    if open_category(page, &agent.site, &agent.pacing, Category::NewArrivals)
        .await?
        .is_none()
    {
        return Ok(None);
    }

    let mut walker = ListingWalker::new(page, &agent.site.listing, &agent.pacing);
    while let Some(listing) = walker.next_page().await? {
        let Some(item) = listing
            .items
            .iter()
            .find(|item| task.matches_title(&item.title) && item.has_link())
        else {
            continue;
        };
        tracing::info!(task = %task.id, title = %item.title, "scheduled product found");

        let report = purchase_until(
            agent.purchaser.as_ref(),
            &item.href,
            DesiredQuantity::Exactly(task.remaining()),
            &agent.pacing,
            agent.max_purchase_attempts,
            |quantity| {
                task.record_fulfilled(quantity);
                match agent.store.upsert_task(&task) {
                    Ok(tasks) => agent.events.emit(AgentEvent::TasksUpdated { tasks }),
                    Err(e) => tracing::error!(
                        task = %task.id,
                        error = format!("{e:#}"),
                        "task progress not saved"
                    ),
                }
                record_purchase(agent, today, item, quantity);
            },
        )
        .await;

        if let Err(e) = page.goto(&listing.current_url).await {
            tracing::warn!(url = %listing.current_url, error = %e, "could not return to listing");
        }
        return Ok(Some(report));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::MockPurchaser;
    use crate::round::tests::agent_with;
    use crate::walker::tests::listing;
    use chrono::Duration;
    use restock_browser::mock::ScriptedPage;
    use restock_browser::Page;
    use restock_core::clock::{now_local, today_local};
    use restock_core::{PurchaseOutcome, TaskStatus};
    use std::sync::Arc;

    const NEW_ARRIVALS: &str = "https://shop/new";

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn due_filter_respects_time_and_completion() {
        let now = at("2024-05-01", "10:00");
        let later = now + Duration::hours(1);
        let in_an_hour = ScheduledTask::new("a", "Figure", "2024-05-01", "11:00", 2);
        let mut done = ScheduledTask::new("b", "Figure", "2024-05-01", "09:00", 2);
        done.fulfilled_quantity = 2;
        let ready = ScheduledTask::new("c", "Figure", "2024-04-30", "23:59", 1);
        let tasks = vec![in_an_hour, done, ready];

        let ids = |v: Vec<ScheduledTask>| v.into_iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(due_tasks(&tasks, now)), ["c"]);
        assert_eq!(ids(due_tasks(&tasks, later)), ["a", "c"]);
    }

    fn pages(page: &ScriptedPage) {
        page.add_document(
            NEW_ARRIVALS,
            listing(
                &[
                    ("Poster", "Naruto", "https://shop/p"),
                    ("Figure A - Deluxe Ver.", "One Piece", "https://shop/fa"),
                    ("Figure A Mini", "One Piece", "https://shop/fm"),
                ],
                None,
            ),
        );
    }

    #[tokio::test]
    async fn substring_match_buys_until_fulfilled_and_persists_each_step() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(ScriptedPage::new());
        pages(&page);
        let purchaser = Arc::new(MockPurchaser::with_outcomes([
            PurchaseOutcome::confirmed(1),
            PurchaseOutcome::confirmed(2),
        ]));
        let mut agent = agent_with(dir.path(), page.clone(), purchaser.clone());
        agent.site.new_arrivals_url = Some(NEW_ARRIVALS.into());
        let task = ScheduledTask::new("01HX", "Figure A", "2000-01-01", "00:00", 3);
        agent.store.save_tasks(&[task]).unwrap();

        assert_eq!(run_due_tasks(&agent, now_local()).await, 1);

        let calls = purchaser.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("https://shop/fa".to_string(), DesiredQuantity::Exactly(3)));
        assert_eq!(calls[1].1, DesiredQuantity::Exactly(2));
        let saved = agent.store.load_tasks().unwrap();
        assert_eq!(saved[0].fulfilled_quantity, 3);
        assert_eq!(saved[0].status, TaskStatus::Completed);

        let events = crate::events::read_event_log(&agent.store.paths().events_jsonl);
        let updates: Vec<_> = events.iter().filter(|e| e["type"] == "tasks_updated").collect();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0]["tasks"][0]["fulfilledQuantity"], 1);

        let history = agent.store.load_history(today_local()).unwrap();
        assert_eq!(history.get("Figure A - Deluxe Ver.").unwrap().quantity, 3);
        assert_eq!(page.current_url().await.unwrap(), NEW_ARRIVALS);

        // Completed now, so the next round does not select it.
        assert_eq!(run_due_tasks(&agent, now_local()).await, 0);
        assert_eq!(purchaser.calls().len(), 2);
    }

    #[tokio::test]
    async fn failure_keeps_progress_already_secured() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(ScriptedPage::new());
        pages(&page);
        let purchaser = Arc::new(MockPurchaser::with_outcomes([PurchaseOutcome::confirmed(1)]));
        let mut agent = agent_with(dir.path(), page.clone(), purchaser.clone());
        agent.site.new_arrivals_url = Some(NEW_ARRIVALS.into());
        let task = ScheduledTask::new("01HX", "Figure A", "2000-01-01", "00:00", 3);
        agent.store.save_tasks(&[task]).unwrap();

        run_due_tasks(&agent, now_local()).await;
        let saved = agent.store.load_tasks().unwrap();
        assert_eq!(saved[0].fulfilled_quantity, 1);
        assert_eq!(saved[0].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn future_tasks_and_missing_products_do_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let page = Arc::new(ScriptedPage::new());
        pages(&page);
        let purchaser = Arc::new(MockPurchaser::new());
        let mut agent = agent_with(dir.path(), page.clone(), purchaser.clone());
        agent.site.new_arrivals_url = Some(NEW_ARRIVALS.into());
        let future = ScheduledTask::new("f", "Figure A", "2999-01-01", "00:00", 1);
        let absent = ScheduledTask::new("g", "Keychain", "2000-01-01", "00:00", 1);
        agent.store.save_tasks(&[future, absent]).unwrap();

        assert_eq!(run_due_tasks(&agent, now_local()).await, 1);
        assert!(purchaser.calls().is_empty());
        assert_eq!(page.visits(NEW_ARRIVALS), 1);
    }
}
