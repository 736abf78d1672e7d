use serde::{Deserialize, Serialize};

/// Mail account the operator configured for notifications.
///
/// Only the addressing is consumed here; delivery happens outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub to: String,
}

fn default_service() -> String {
    "qq".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            user: String::new(),
            pass: String::new(),
            to: String::new(),
        }
    }
}

impl MailConfig {
    /// Sender, recipient and auth code are all present.
    pub fn is_complete(&self) -> bool {
        !self.user.trim().is_empty() && !self.to.trim().is_empty() && !self.pass.is_empty()
    }

    /// Copy safe to print or ship to a relay log: the auth code is masked.
    pub fn redacted(&self) -> Self {
        Self {
            pass: if self.pass.is_empty() {
                String::new()
            } else {
                "********".to_string()
            },
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_qq_service() {
        let cfg: MailConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.service, "qq");
        assert!(!cfg.is_complete());
    }

    #[test]
    fn complete_needs_pass() {
        let mut cfg = MailConfig {
            user: "me@qq.com".into(),
            to: "you@qq.com".into(),
            ..Default::default()
        };
        assert!(!cfg.is_complete());
        cfg.pass = "code".into();
        assert!(cfg.is_complete());
        assert_eq!(cfg.redacted().pass, "********");
    }
}
