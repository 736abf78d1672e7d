use crate::Notification;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ── Config ──

/// Push channel, stored in `config.json` under `notify_channels`.
#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum Channel {
    #[serde(rename = "ntfy")]
    Ntfy {
        url: String,
        #[serde(default = "all_events")]
        events: Vec<String>,
    },
    #[serde(rename = "webhook")]
    Webhook {
        url: String,
        #[serde(default = "all_events")]
        events: Vec<String>,
    },
    #[serde(rename = "telegram")]
    Telegram {
        bot_token: String,
        chat_id: String,
        #[serde(default = "all_events")]
        events: Vec<String>,
    },
}

fn all_events() -> Vec<String> {
    vec!["*".to_string()]
}

impl Channel {
    pub fn events(&self) -> &[String] {
        match self {
            Channel::Ntfy { events, .. }
            | Channel::Webhook { events, .. }
            | Channel::Telegram { events, .. } => events,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Channel::Ntfy { url, .. } => format!("ntfy({url})"),
            Channel::Webhook { url, .. } => format!("webhook({url})"),
            Channel::Telegram { chat_id, .. } => format!("telegram(chat:{chat_id})"),
        }
    }

    /// Subscribed to `event` by name or through `*`.
    pub fn wants(&self, event: &str) -> bool {
        self.events().iter().any(|e| e == event || e == "*")
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NotifyConfig {
    pub channels: Vec<Channel>,
}

impl NotifyConfig {
    /// Read the `notify_channels` key of `config.json`. A missing file, key or
    /// malformed channel list yields no channels.
    pub fn load(config_json: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(config_json) else {
            return Self::default();
        };
        let Ok(val) = serde_json::from_str::<serde_json::Value>(&content) else {
            return Self::default();
        };
        let Some(channels_val) = val.get("notify_channels") else {
            return Self::default();
        };
        match serde_json::from_value(channels_val.clone()) {
            Ok(channels) => Self { channels },
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed notify_channels");
                Self::default()
            }
        }
    }
}

// ── Dispatch ──

const TIMEOUT: Duration = Duration::from_secs(5);

/// Deliver to every subscribed channel. Returns the per-channel outcome;
/// failures are logged, never propagated.
pub fn dispatch(
    config: &NotifyConfig,
    notification: &Notification,
) -> Vec<(String, Result<(), String>)> {
    let event = notification.event_name();
    config
        .channels
        .iter()
        .filter(|ch| ch.wants(event))
        .map(|ch| {
            let name = ch.display_name();
            let result = send(ch, notification).map_err(|e| e.to_string());
            if let Err(e) = &result {
                tracing::warn!(channel = %name, error = %e, "notification delivery failed");
            }
            (name, result)
        })
        .collect()
}

/// Send a fixed test message to every configured channel regardless of its
/// subscriptions.
pub fn test_channels(config: &NotifyConfig) -> Vec<(String, Result<(), String>)> {
    let test = Notification {
        subject: "restock notify test".to_string(),
        text: "If you see this, restock notifications are working.".to_string(),
        html: "<p>If you see this, restock notifications are working.</p>".to_string(),
        total: 0,
        new_count: 0,
        matched_count: 0,
        first_run_of_day: false,
        mail: None,
    };
    config
        .channels
        .iter()
        .map(|ch| (ch.display_name(), send(ch, &test).map_err(|e| e.to_string())))
        .collect()
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .build()
        .new_agent()
}

fn send(channel: &Channel, n: &Notification) -> anyhow::Result<()> {
    match channel {
        Channel::Ntfy { url, .. } => {
            // Header values must be ASCII, so the subject travels in the body.
            let (body, priority) = format_ntfy(n);
            agent()
                .post(url)
                .header("Priority", priority)
                .header("Tags", "shopping_cart")
                .send(&body)?;
        }
        Channel::Webhook { url, .. } => {
            agent()
                .post(url)
                .header("Content-Type", "application/json")
                .send(format_webhook(n).to_string())?;
        }
        Channel::Telegram {
            bot_token, chat_id, ..
        } => {
            let url = format!("https://api.telegram.org/bot{bot_token}/sendMessage");
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": format_telegram(n),
            });
            agent()
                .post(&url)
                .header("Content-Type", "application/json")
                .send(body.to_string())?;
        }
    }
    Ok(())
}

fn format_ntfy(n: &Notification) -> (String, &'static str) {
    let priority = if n.new_count > 0 { "high" } else { "default" };
    (format!("{}\n\n{}", n.subject, n.text), priority)
}

fn format_webhook(n: &Notification) -> serde_json::Value {
    serde_json::json!({
        "event_type": n.event_name(),
        "data": n,
    })
}

fn format_telegram(n: &Notification) -> String {
    format!("{}\n\n{}", n.subject, n.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MailEnvelope;

    fn notification(first: bool, new_count: usize) -> Notification {
        Notification {
            subject: "JumpShop 再贩通知 - 2024-05-01 09:30:00".into(),
            text: "body".into(),
            html: "<p>body</p>".into(),
            total: 3,
            new_count,
            matched_count: 1,
            first_run_of_day: first,
            mail: Some(MailEnvelope {
                service: "qq".into(),
                from: "me@qq.com".into(),
                to: "you@qq.com".into(),
            }),
        }
    }

    #[test]
    fn config_deserialize_all_types() {
        let json = r#"[
            {"type":"ntfy","url":"https://ntfy.sh/t","events":["new_items"]},
            {"type":"webhook","url":"https://relay.local/mail"},
            {"type":"telegram","bot_token":"123:ABC","chat_id":"456","events":["first_of_day"]}
        ]"#;
        let channels: Vec<Channel> = serde_json::from_str(json).unwrap();
        assert_eq!(channels.len(), 3);
        assert!(channels[0].wants("new_items"));
        assert!(!channels[0].wants("first_of_day"));
        assert!(channels[1].wants("first_of_day"));
        assert_eq!(channels[2].display_name(), "telegram(chat:456)");
    }

    #[test]
    fn load_missing_or_malformed_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(NotifyConfig::load(&path).channels.is_empty());

        std::fs::write(&path, r#"{"notify_channels": [{"type":"carrier-pigeon"}]}"#).unwrap();
        assert!(NotifyConfig::load(&path).channels.is_empty());

        std::fs::write(
            &path,
            r#"{"round_interval_secs": 30,
                "notify_channels": [{"type":"ntfy","url":"https://ntfy.sh/x"}]}"#,
        )
        .unwrap();
        assert_eq!(NotifyConfig::load(&path).channels.len(), 1);
    }

    #[test]
    fn dispatch_skips_unsubscribed_channels() {
        let config = NotifyConfig {
            channels: vec![Channel::Ntfy {
                url: "http://127.0.0.1:9/unused".into(),
                events: vec!["first_of_day".into()],
            }],
        };
        assert!(dispatch(&config, &notification(false, 1)).is_empty());
    }

    #[test]
    fn webhook_payload_carries_envelope() {
        let payload = format_webhook(&notification(false, 2));
        assert_eq!(payload["event_type"], "new_items");
        assert_eq!(payload["data"]["mail"]["to"], "you@qq.com");
        assert_eq!(payload["data"]["new_count"], 2);
        assert_eq!(payload["data"]["html"], "<p>body</p>");
    }

    #[test]
    fn ntfy_priority_tracks_new_items() {
        assert_eq!(format_ntfy(&notification(false, 2)).1, "high");
        let (body, priority) = format_ntfy(&notification(true, 0));
        assert_eq!(priority, "default");
        assert!(body.ends_with("\n\nbody"));
        assert!(format_telegram(&notification(true, 0)).starts_with("JumpShop"));
    }
}
