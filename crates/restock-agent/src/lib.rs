//! The watcher's control loop.
//!
//! Each round runs due scheduled tasks against the new-arrivals listing, then
//! walks the restock listing page by page, matches titles against the
//! watch-list, buys what is still wanted today, and notifies when the
//! listing changed or the day's first round completes.

pub mod config;
pub mod events;
pub mod matcher;
pub mod purchase;
pub mod round;
pub mod scheduled;
pub mod site;
pub mod state;
pub mod walker;

pub use config::{AgentConfig, Pacing};
pub use events::{AgentEvent, EventLogger};
pub use purchase::{MockPurchaser, PurchaseError, PurchaseFlow, Purchaser};
pub use round::{reconcile, Agent, Reconciliation, RoundState};
pub use scheduled::due_tasks;
pub use site::{Category, SiteProfile};
