use anyhow::{Context, Result};
use restock_agent::{Agent, AgentConfig, EventLogger, PurchaseFlow, RoundState, SiteProfile};
use restock_browser::WebDriverPage;
use restock_notify::{ChannelNotifier, FanoutNotifier, LogNotifier, NotifyConfig};
use restock_store::{try_lock_file, StateStore, StorePaths};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// `restock run [--webdriver URL] [--once]`
pub fn execute(paths: &StorePaths, webdriver: Option<String>, once: bool) -> Result<()> {
    let _lock = try_lock_file(&paths.lock_file)?;
    let mut config = AgentConfig::load(&paths.config_json)?;
    if let Some(url) = webdriver {
        config.webdriver_url = url;
    }

    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_agent(paths, &config, once, cancel))
}

async fn run_agent(
    paths: &StorePaths,
    config: &AgentConfig,
    once: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let debugger = config.chrome_debugger_address.as_deref();
    let page = WebDriverPage::connect(&config.webdriver_url, debugger)
        .await
        .context("is chromedriver running and Chrome started with remote debugging?")?;
    let page = Arc::new(page);

    let site = SiteProfile::from_config(config);
    let purchaser = PurchaseFlow::new(
        page.clone(),
        site.checkout.clone(),
        site.cart_url.clone(),
        config.pacing(),
    );
    let notifier = FanoutNotifier::new()
        .with(LogNotifier)
        .with(ChannelNotifier::new(NotifyConfig::load(&paths.config_json)));
    let events = EventLogger::new(Some(paths.events_jsonl.clone()), config.emit_stdout_events);
    let agent = Agent::new(
        config,
        page.clone(),
        Arc::new(purchaser),
        Arc::new(notifier),
        StateStore::new(paths.clone()),
        events,
    );

    tracing::info!(data_dir = %paths.root.display(), "agent attached");
    let result = if once {
        agent.run_round(&RoundState::default()).await.map(|_| ())
    } else {
        agent.run_forever(cancel).await;
        Ok(())
    };

    drop(agent);
    if let Ok(page) = Arc::try_unwrap(page) {
        if let Err(e) = page.close().await {
            tracing::warn!(error = %e, "webdriver session did not close cleanly");
        }
    }
    result
}

fn ctrlc_cancel(cancel: CancellationToken) {
    let _ = ctrlc::set_handler(move || {
        tracing::info!("stop requested, finishing current round");
        cancel.cancel();
    });
}
