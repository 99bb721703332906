//! Scheduled digests: low-stock alerts and daily order summaries.
//!
//! The [`scheduler::NotificationScheduler`] owns the cron-facing flow:
//! tenant selection, dedup stamping, and the send. The detectors in
//! [`low_stock`] and [`summary`] own what each digest actually says.

pub mod error;
pub mod low_stock;
pub mod money;
pub mod scheduler;
pub mod summary;
pub mod time;

pub use {
    error::{Error, Result},
    low_stock::LowStockDetector,
    money::render_money,
    scheduler::{DigestKind, NotificationScheduler},
    summary::SummaryAggregator,
};
