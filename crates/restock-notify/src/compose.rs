use chrono::NaiveDateTime;
use restock_core::clock::display_timestamp;
use restock_core::{DailyHistory, ListedItem, RoundSnapshot};
use restock_store::MailConfig;
use serde::Serialize;
use std::fmt::Write as _;

pub const UNKNOWN_CAPTION: &str = "未知IP";

/// Sender and recipient for an external mail relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailEnvelope {
    pub service: String,
    pub from: String,
    pub to: String,
}

impl MailEnvelope {
    /// `None` unless the config is complete: sender, recipient and auth code.
    /// The auth code itself never leaves the store.
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        if !config.is_complete() {
            return None;
        }
        Some(Self {
            service: config.service.clone(),
            from: config.user.clone(),
            to: config.to.clone(),
        })
    }
}

/// One round's notification payload.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub total: usize,
    pub new_count: usize,
    pub matched_count: usize,
    pub first_run_of_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailEnvelope>,
}

impl Notification {
    /// Channel event name this notification is delivered under.
    pub fn event_name(&self) -> &'static str {
        if self.first_run_of_day {
            "first_of_day"
        } else {
            "new_items"
        }
    }
}

/// Build the notification for a round: the whole current listing (new items
/// marked unless this is the day's first notification) followed by today's
/// matched purchases.
pub fn compose(
    snapshot: &RoundSnapshot,
    new_items: &[ListedItem],
    matched: &DailyHistory,
    first_run_of_day: bool,
    now: NaiveDateTime,
    mail: Option<&MailConfig>,
) -> Notification {
    let is_new = |title: &str| !first_run_of_day && new_items.iter().any(|n| n.title == title);

    let mut text = format!("当前再贩列表 (总数: {})\n", snapshot.len());
    let mut html = format!("<h2>当前再贩列表 (总数: {})</h2><ul>", snapshot.len());
    for item in snapshot.items() {
        let fresh = is_new(&item.title);
        let tag = if fresh { " [NEW]" } else { "" };
        let style = if fresh {
            "color: red; font-weight: bold;"
        } else {
            ""
        };
        let _ = writeln!(text, "- 【{}】{}{}", item.caption, item.title, tag);
        let _ = write!(
            html,
            "<li style=\"{style}\">【{}】{}{tag}</li>",
            escape(&item.caption),
            escape(&item.title)
        );
    }
    html.push_str("</ul>");

    text.push_str("\n今日已匹配目标\n");
    html.push_str("<h2>今日已匹配目标</h2><ul>");
    if matched.is_empty() {
        text.push_str("- 暂无匹配\n");
        html.push_str("<li>暂无匹配</li>");
    }
    for entry in &matched.items {
        let caption: &str = if entry.caption.is_empty() {
            snapshot.caption(&entry.title).unwrap_or(UNKNOWN_CAPTION)
        } else {
            &entry.caption
        };
        let _ = writeln!(text, "- 【{caption}】{} x{}", entry.title, entry.quantity);
        let _ = write!(
            html,
            "<li><span style=\"color: green;\">【{}】{}</span></li>",
            escape(caption),
            escape(&entry.title)
        );
    }
    html.push_str("</ul>");

    Notification {
        subject: format!("JumpShop 再贩通知 - {}", display_timestamp(now)),
        text,
        html,
        total: snapshot.len(),
        new_count: if first_run_of_day { 0 } else { new_items.len() },
        matched_count: matched.len(),
        first_run_of_day,
        mail: mail.and_then(MailEnvelope::from_config),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use restock_core::HistoryEntry;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn snapshot() -> RoundSnapshot {
        [("Acrylic Stand A", "One Piece"), ("Badge B", "Naruto")]
            .into_iter()
            .collect()
    }

    #[test]
    fn marks_new_items_after_first_run() {
        let new_items = vec![ListedItem {
            title: "Badge B".into(),
            caption: "Naruto".into(),
        }];
        let history = DailyHistory::empty(now().date());
        let n = compose(&snapshot(), &new_items, &history, false, now(), None);
        assert_eq!(n.subject, "JumpShop 再贩通知 - 2024-05-01 09:30:00");
        assert!(n.text.contains("【Naruto】Badge B [NEW]"));
        assert!(!n.text.contains("Acrylic Stand A [NEW]"));
        assert!(n.text.contains("暂无匹配"));
        assert!(n.html.contains("color: red"));
        assert_eq!((n.total, n.new_count, n.matched_count), (2, 1, 0));
        assert_eq!(n.event_name(), "new_items");
    }

    #[test]
    fn first_run_of_day_has_no_new_markers() {
        let new_items = vec![ListedItem {
            title: "Badge B".into(),
            caption: "Naruto".into(),
        }];
        let history = DailyHistory::empty(now().date());
        let n = compose(&snapshot(), &new_items, &history, true, now(), None);
        assert!(!n.text.contains("[NEW]"));
        assert!(!n.html.contains("[NEW]"));
        assert_eq!(n.new_count, 0);
        assert_eq!(n.event_name(), "first_of_day");
    }

    #[test]
    fn matched_caption_falls_back_to_snapshot_then_unknown() {
        let mut history = DailyHistory::empty(now().date());
        history.record(HistoryEntry::new("Badge B", "", 2, "t"));
        history.record(HistoryEntry::new("Gone Item", "", 1, "t"));
        history.record(HistoryEntry::new("Keychain", "Bleach", 1, "t"));
        let n = compose(&snapshot(), &[], &history, false, now(), None);
        assert!(n.text.contains("【Naruto】Badge B x2"));
        assert!(n.text.contains("【未知IP】Gone Item x1"));
        assert!(n.text.contains("【Bleach】Keychain x1"));
        assert_eq!(n.matched_count, 3);
    }

    #[test]
    fn html_is_escaped() {
        let snapshot: RoundSnapshot = [("<b>Tee</b>", "A&B")].into_iter().collect();
        let history = DailyHistory::empty(now().date());
        let n = compose(&snapshot, &[], &history, true, now(), None);
        assert!(n.html.contains("【A&amp;B】&lt;b&gt;Tee&lt;/b&gt;"));
    }

    #[test]
    fn envelope_requires_complete_mail_config() {
        let mut config = MailConfig::default();
        assert!(MailEnvelope::from_config(&config).is_none());
        config.user = "me@qq.com".into();
        config.to = "you@qq.com".into();
        // No auth code: mail is skipped.
        assert!(MailEnvelope::from_config(&config).is_none());
        config.pass = "code".into();
        let history = DailyHistory::empty(now().date());
        let n = compose(&snapshot(), &[], &history, true, now(), Some(&config));
        let mail = n.mail.unwrap();
        assert_eq!(mail.from, "me@qq.com");
        assert_eq!(mail.service, "qq");
    }
}
