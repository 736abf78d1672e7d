use anyhow::Result;
use clap::Subcommand;
use restock_store::{MailConfig, StateStore, StorePaths};

#[derive(Subcommand)]
pub enum MailCmd {
    /// Print the mail config with the auth code masked
    Show,
    /// Update fields of the mail config
    Set {
        #[arg(long)]
        service: Option<String>,
        /// Sender account
        #[arg(long)]
        user: Option<String>,
        /// SMTP auth code
        #[arg(long)]
        pass: Option<String>,
        /// Recipient
        #[arg(long)]
        to: Option<String>,
    },
}

pub fn run(cmd: MailCmd, paths: &StorePaths) -> Result<()> {
    let store = StateStore::new(paths.clone());
    match cmd {
        MailCmd::Show => {
            match store.load_mail_config()? {
                Some(config) => println!("{}", serde_json::to_string_pretty(&config.redacted())?),
                None => println!("No mail config."),
            }
            Ok(())
        }
        MailCmd::Set {
            service,
            user,
            pass,
            to,
        } => {
            let mut config = store.load_mail_config()?.unwrap_or_default();
            apply(&mut config, service, user, pass, to);
            store.save_mail_config(&config)?;
            if !config.is_complete() {
                println!("saved; mail stays off until sender, recipient and auth code are set");
            } else {
                println!("saved");
            }
            Ok(())
        }
    }
}

fn apply(
    config: &mut MailConfig,
    service: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    to: Option<String>,
) {
    if let Some(v) = service {
        config.service = v;
    }
    if let Some(v) = user {
        config.user = v;
    }
    if let Some(v) = pass {
        config.pass = v;
    }
    if let Some(v) = to {
        config.to = v;
    }
}
