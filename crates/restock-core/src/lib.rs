pub mod clock;
pub mod history;
pub mod listing;
pub mod purchase;
pub mod snapshot;
pub mod target;
pub mod task;

pub use history::{DailyHistory, HistoryEntry};
pub use listing::ScrapedItem;
pub use purchase::{DesiredQuantity, PurchaseOutcome};
pub use snapshot::{ListedItem, RoundSnapshot};
pub use target::{find_target, Target};
pub use task::{ScheduledTask, TaskStatus};
