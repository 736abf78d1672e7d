use anyhow::{Context, Result};
use clap::Subcommand;
use restock_core::{ScheduledTask, TaskStatus};
use restock_store::{StateStore, StorePaths};

#[derive(Subcommand)]
pub enum TasksCmd {
    /// List scheduled tasks
    List,
    /// Schedule a purchase: product name is matched as a substring of new-arrival titles
    Add {
        product: String,
        /// Local date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Local time, HH:MM
        #[arg(long)]
        time: String,
        /// Units to buy in total
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Delete a task
    Remove { id: String },
    /// Clear a task's progress so it runs again
    Reset { id: String },
}

pub fn run(cmd: TasksCmd, paths: &StorePaths) -> Result<()> {
    let store = StateStore::new(paths.clone());
    match cmd {
        TasksCmd::List => list(&store),
        TasksCmd::Add {
            product,
            date,
            time,
            quantity,
        } => {
            let task = add(&store, &product, &date, &time, quantity)?;
            println!(
                "{}  {} at {} {}",
                task.id, task.product_name, task.target_date, task.target_time
            );
            Ok(())
        }
        TasksCmd::Remove { id } => {
            let mut tasks = store.load_tasks()?;
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                anyhow::bail!("no task with id {id}");
            }
            store.save_tasks(&tasks)?;
            println!("removed {id}");
            Ok(())
        }
        TasksCmd::Reset { id } => {
            reset(&store, &id)?;
            println!("reset {id}");
            Ok(())
        }
    }
}

fn list(store: &StateStore) -> Result<()> {
    let tasks = store.load_tasks()?;
    if tasks.is_empty() {
        println!("No scheduled tasks.");
        return Ok(());
    }
    for t in &tasks {
        let status = match t.status {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        };
        println!(
            "{}  {} {}  {}/{}  {:<9}  {}",
            t.id,
            t.target_date,
            t.target_time,
            t.fulfilled_quantity,
            t.target_quantity,
            status,
            t.product_name
        );
    }
    Ok(())
}

fn add(
    store: &StateStore,
    product: &str,
    date: &str,
    time: &str,
    quantity: u32,
) -> Result<ScheduledTask> {
    if product.trim().is_empty() {
        anyhow::bail!("product name must not be empty");
    }
    if quantity == 0 {
        anyhow::bail!("quantity must be at least 1");
    }
    let id = ulid::Ulid::new().to_string();
    let task = ScheduledTask::new(id, product.trim(), date, time, quantity);
    task.due_at()
        .with_context(|| format!("invalid schedule '{date} {time}', expected YYYY-MM-DD HH:MM"))?;
    store.upsert_task(&task)?;
    Ok(task)
}

fn reset(store: &StateStore, id: &str) -> Result<()> {
    let mut task = store
        .load_tasks()?
        .into_iter()
        .find(|t| t.id == id)
        .with_context(|| format!("no task with id {id}"))?;
    task.fulfilled_quantity = 0;
    task.status = TaskStatus::Pending;
    store.upsert_task(&task)?;
    Ok(())
}
