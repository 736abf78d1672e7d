//! Round notifications: composition plus the sinks that deliver them.

mod channel;
mod compose;

pub use channel::{dispatch, test_channels, Channel, NotifyConfig};
pub use compose::{compose, MailEnvelope, Notification, UNKNOWN_CAPTION};

use std::sync::{Arc, Mutex};

/// Where composed notifications go. A failing sink never fails the round.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Logs the subject and counts at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, n: &Notification) -> anyhow::Result<()> {
        tracing::info!(
            subject = %n.subject,
            total = n.total,
            new = n.new_count,
            matched = n.matched_count,
            first_of_day = n.first_run_of_day,
            "notification"
        );
        tracing::debug!("{}", n.text);
        Ok(())
    }
}

/// Delivers over the configured push channels on the blocking pool.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    config: Arc<NotifyConfig>,
}

impl ChannelNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, n: &Notification) -> anyhow::Result<()> {
        if self.config.channels.is_empty() {
            return Ok(());
        }
        let config = Arc::clone(&self.config);
        let n = n.clone();
        let results = tokio::task::spawn_blocking(move || dispatch(&config, &n)).await?;
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            anyhow::bail!("{failed} of {} channel(s) failed", results.len());
        }
        Ok(())
    }
}

/// Forwards to every inner sink; one failure does not stop the rest.
#[derive(Default, Clone)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Notifier + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }
}

#[async_trait::async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, n: &Notification) -> anyhow::Result<()> {
        let mut errors = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = sink.notify(n).await {
                errors.push(e.to_string());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(errors.join("; "))
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl CollectNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collected(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Notifier for CollectNotifier {
    async fn notify(&self, n: &Notification) -> anyhow::Result<()> {
        match self.seen.lock() {
            Ok(mut seen) => seen.push(n.clone()),
            Err(_) => anyhow::bail!("collector poisoned"),
        }
        Ok(())
    }
}
