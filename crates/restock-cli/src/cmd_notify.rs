use anyhow::Result;
use clap::Subcommand;
use restock_notify::{MailEnvelope, NotifyConfig};
use restock_store::{StateStore, StorePaths};

const EXAMPLE_CHANNELS: &str =
    r#"[{"type":"ntfy","url":"https://ntfy.sh/my-restock-topic","events":["new_items"]}]"#;

#[derive(Subcommand)]
pub enum NotifyCmd {
    /// Push a test message through every configured channel
    Test,
    /// List channels, their event filters and the mail envelope
    Status,
}

pub fn run(cmd: NotifyCmd, paths: &StorePaths) -> Result<()> {
    let channels = NotifyConfig::load(&paths.config_json);
    match cmd {
        NotifyCmd::Test => send_test(&channels),
        NotifyCmd::Status => print_status(&channels, &StateStore::new(paths.clone())),
    }
}

fn send_test(channels: &NotifyConfig) -> Result<()> {
    if channels.channels.is_empty() {
        println!("No push channels in config.json. Example:");
        println!("  restock config set notify_channels '{EXAMPLE_CHANNELS}'");
        return Ok(());
    }
    let mut failed = 0usize;
    for (name, result) in restock_notify::test_channels(channels) {
        match result {
            Ok(()) => println!("  sent    {name}"),
            Err(e) => {
                failed += 1;
                println!("  failed  {name}: {e}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} channel(s) failed", channels.channels.len());
    }
    Ok(())
}

fn print_status(channels: &NotifyConfig, store: &StateStore) -> Result<()> {
    if channels.channels.is_empty() {
        println!("push channels: none");
    } else {
        println!("push channels:");
        for ch in &channels.channels {
            println!("  {:<40} events={}", ch.display_name(), ch.events().join(","));
        }
    }
    let envelope = store
        .load_mail_config()?
        .and_then(|cfg| MailEnvelope::from_config(&cfg));
    match envelope {
        Some(env) => println!("mail: {} -> {} via {}", env.from, env.to, env.service),
        None => println!("mail: incomplete, skipped (set --user, --pass and --to)"),
    }
    Ok(())
}
