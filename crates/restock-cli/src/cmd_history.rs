use anyhow::Result;
use restock_core::clock::today_local;
use restock_store::{StateStore, StorePaths};

/// `restock history [--json]`
pub fn execute(paths: &StorePaths, json: bool) -> Result<()> {
    let history = StateStore::new(paths.clone()).load_history(today_local())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("No matches today ({}).", history.date);
        return Ok(());
    }
    println!("Matched on {}:", history.date);
    for item in &history.items {
        let caption: &str = if item.caption.is_empty() {
            restock_notify::UNKNOWN_CAPTION
        } else {
            &item.caption
        };
        println!("  【{caption}】{}  x{}  {}", item.title, item.quantity, item.matched_at);
    }
    Ok(())
}
