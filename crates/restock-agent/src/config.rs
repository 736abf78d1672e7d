//! Agent settings: the flat keys of `config.json` and the delays derived
//! from them.

use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub webdriver_url: String,
    /// `host:port` of a Chrome started with remote debugging; the session
    /// attaches to it instead of launching a new browser.
    pub chrome_debugger_address: Option<String>,
    pub home_url: String,
    /// Direct link to the restock listing; resolved from the home page if unset.
    pub restock_url: Option<String>,
    /// Direct link to the new-arrivals listing; resolved from the home page if unset.
    pub new_arrivals_url: Option<String>,
    pub cart_url: String,
    pub round_interval_secs: u64,
    pub recovery_interval_secs: u64,
    pub retry_delay_secs: u64,
    pub page_jitter_min_ms: u64,
    pub page_jitter_max_ms: u64,
    pub listing_timeout_secs: u64,
    pub quantity_timeout_secs: u64,
    pub checkout_timeout_secs: u64,
    pub confirm_timeout_secs: u64,
    pub max_purchase_attempts: u32,
    pub emit_stdout_events: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            chrome_debugger_address: Some("127.0.0.1:9223".to_string()),
            home_url: "https://jumpshop-online.com/".to_string(),
            restock_url: None,
            new_arrivals_url: None,
            cart_url: "https://jumpshop-online.com/cart".to_string(),
            round_interval_secs: 60,
            recovery_interval_secs: 60,
            retry_delay_secs: 5,
            page_jitter_min_ms: 1000,
            page_jitter_max_ms: 3000,
            listing_timeout_secs: 5,
            quantity_timeout_secs: 10,
            checkout_timeout_secs: 10,
            confirm_timeout_secs: 60,
            max_purchase_attempts: 10,
            emit_stdout_events: true,
        }
    }
}

impl AgentConfig {
    /// Read `config.json`. Missing file means defaults; unknown keys (such as
    /// `notify_channels`) are ignored.
    pub fn load(config_json: &Path) -> anyhow::Result<Self> {
        let map = restock_store::config::read_config(config_json)?;
        serde_json::from_value(serde_json::Value::Object(map))
            .with_context(|| format!("invalid agent settings in {}", config_json.display()))
    }

    pub fn pacing(&self) -> Pacing {
        let min = Duration::from_millis(self.page_jitter_min_ms);
        let max = Duration::from_millis(self.page_jitter_max_ms.max(self.page_jitter_min_ms));
        Pacing {
            round_interval: Duration::from_secs(self.round_interval_secs),
            recovery_interval: Duration::from_secs(self.recovery_interval_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            page_jitter: (min, max),
            scroll_settle: Duration::from_millis(500),
            after_add_to_cart: Duration::from_secs(2),
            entry_link_timeout: Duration::from_secs(5),
            listing_timeout: Duration::from_secs(self.listing_timeout_secs),
            quantity_timeout: Duration::from_secs(self.quantity_timeout_secs),
            checkout_timeout: Duration::from_secs(self.checkout_timeout_secs),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
        }
    }
}

/// Every sleep and bounded wait the agent performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub round_interval: Duration,
    pub recovery_interval: Duration,
    /// Between purchase attempts for the same item.
    pub retry_delay: Duration,
    /// Random delay range before loading the next listing page.
    pub page_jitter: (Duration, Duration),
    pub scroll_settle: Duration,
    pub after_add_to_cart: Duration,
    pub entry_link_timeout: Duration,
    pub listing_timeout: Duration,
    pub quantity_timeout: Duration,
    pub checkout_timeout: Duration,
    pub confirm_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        AgentConfig::default().pacing()
    }
}

impl Pacing {
    /// No sleeps and zero-length waits.
    pub fn instant() -> Self {
        Self {
            round_interval: Duration::ZERO,
            recovery_interval: Duration::ZERO,
            retry_delay: Duration::ZERO,
            page_jitter: (Duration::ZERO, Duration::ZERO),
            scroll_settle: Duration::ZERO,
            after_add_to_cart: Duration::ZERO,
            entry_link_timeout: Duration::ZERO,
            listing_timeout: Duration::ZERO,
            quantity_timeout: Duration::ZERO,
            checkout_timeout: Duration::ZERO,
            confirm_timeout: Duration::ZERO,
        }
    }

    pub fn jitter(&self) -> Duration {
        let (min, max) = self.page_jitter;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Sleep unless `d` is zero.
pub(crate) async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AgentConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg, AgentConfig::default());
        assert_eq!(cfg.pacing().round_interval, Duration::from_secs(60));
    }

    #[test]
    fn partial_file_overrides_and_ignores_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"round_interval_secs": 30, "restock_url": "https://shop/restock",
                "notify_channels": [{"type":"ntfy","url":"https://ntfy.sh/x"}]}"#,
        )
        .unwrap();
        let cfg = AgentConfig::load(&path).unwrap();
        assert_eq!(cfg.round_interval_secs, 30);
        assert_eq!(cfg.restock_url.as_deref(), Some("https://shop/restock"));
        assert_eq!(cfg.retry_delay_secs, 5);
    }

    #[test]
    fn wrong_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"round_interval_secs": "soon"}"#).unwrap();
        let err = AgentConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn jitter_stays_in_range() {
        let pacing = AgentConfig::default().pacing();
        for _ in 0..50 {
            let d = pacing.jitter();
            assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(3000));
        }
        assert_eq!(Pacing::instant().jitter(), Duration::ZERO);
    }
}
