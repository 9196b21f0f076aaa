//! Daily and weekly progress rollups.
//!
//! [`DailyProgress`] is updated incrementally as sessions finish;
//! [`WeeklyStats`] is always recomputed from the daily records.

mod daily;
mod weekly;

pub use daily::{AreaProgress, DailyProgress};
pub use weekly::WeeklyStats;
