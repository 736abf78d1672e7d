use anyhow::Result;
use clap::Subcommand;
use restock_store::config::{parse_value, read_config, set_value};
use restock_store::StorePaths;

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. round_interval_secs)
        key: String,
        /// Value: true/false, number, JSON array/object, or string
        value: String,
    },
    /// Get a config value
    Get { key: String },
    /// List all config values
    List,
}

pub fn run(cmd: ConfigCmd, paths: &StorePaths) -> Result<()> {
    let path = &paths.config_json;
    match cmd {
        ConfigCmd::Set { key, value } => {
            set_value(path, &key, parse_value(&value))?;
            println!("{key} = {value}");
        }
        ConfigCmd::Get { key } => match read_config(path)?.get(&key) {
            Some(v) => println!("{v}"),
            None => println!("{key} is not set"),
        },
        ConfigCmd::List => {
            let config = read_config(path)?;
            if config.is_empty() {
                println!("No config values set (defaults apply).");
            }
            for (k, v) in &config {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}
