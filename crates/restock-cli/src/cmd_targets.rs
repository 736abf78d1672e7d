use anyhow::Result;
use clap::Subcommand;
use restock_core::Target;
use restock_store::{StateStore, StorePaths};

#[derive(Subcommand)]
pub enum TargetsCmd {
    /// List watched titles
    List,
    /// Watch a title (exact match); re-adding updates its quantity
    Add {
        title: String,
        /// Units wanted; omit to buy as many as the page allows
        #[arg(long)]
        quantity: Option<u32>,
    },
    /// Stop watching a title
    Remove { title: String },
}

pub fn run(cmd: TargetsCmd, paths: &StorePaths) -> Result<()> {
    let store = StateStore::new(paths.clone());
    match cmd {
        TargetsCmd::List => list(&store),
        TargetsCmd::Add { title, quantity } => {
            add(&store, &title, quantity)?;
            println!("watching {title}");
            Ok(())
        }
        TargetsCmd::Remove { title } => {
            if remove(&store, &title)? {
                println!("removed {title}");
            } else {
                println!("not watched: {title}");
            }
            Ok(())
        }
    }
}

fn list(store: &StateStore) -> Result<()> {
    let targets = store.load_targets()?;
    if targets.is_empty() {
        println!("No targets.");
        return Ok(());
    }
    for t in &targets {
        match t.quantity {
            Some(n) if n > 0 => println!("  {}  x{n}", t.title),
            _ => println!("  {}  (max available)", t.title),
        }
    }
    Ok(())
}

fn add(store: &StateStore, title: &str, quantity: Option<u32>) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        anyhow::bail!("title must not be empty");
    }
    let mut targets = store.load_targets()?;
    match targets.iter_mut().find(|t| t.title == title) {
        Some(existing) => existing.quantity = quantity,
        None => targets.push(Target::new(title, quantity)),
    }
    store.save_targets(&targets)
}

fn remove(store: &StateStore, title: &str) -> Result<bool> {
    let mut targets = store.load_targets()?;
    let before = targets.len();
    targets.retain(|t| t.title != title.trim());
    if targets.len() == before {
        return Ok(false);
    }
    store.save_targets(&targets)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_updates_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(StorePaths::discover(dir.path()));
        add(&store, " Figure A ", Some(2)).unwrap();
        add(&store, "Badge B", None).unwrap();
        add(&store, "Figure A", Some(5)).unwrap();

        let targets = store.load_targets().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0], Target::new("Figure A", Some(5)));

        assert!(remove(&store, "Badge B").unwrap());
        assert!(!remove(&store, "Badge B").unwrap());
        assert_eq!(store.load_targets().unwrap().len(), 1);
        assert!(add(&store, "  ", None).is_err());
    }
}
