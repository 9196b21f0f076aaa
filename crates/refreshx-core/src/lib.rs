//! # RefreshX Core Library
//!
//! Break scheduling and progress tracking for desk workers. The library
//! decides when breaks should happen during the workday, tracks break and
//! exercise sessions through their lifecycles, keeps a consecutive-day
//! streak, and rolls activity up into daily and weekly progress.
//!
//! A CLI binary and any GUI host sit on top of the same [`Engine`].
//!
//! ## Architecture
//!
//! - **Scheduling**: [`BreakScheduler`] spreads breaks evenly across the
//!   work window
//! - **Sessions**: [`BreakSession`] and [`ExerciseSession`] state machines
//! - **Progress**: [`Streak`], [`DailyProgress`] and [`WeeklyStats`]
//! - **Inbox**: stored [`Notification`]s, fed by milestones and goals
//! - **Storage**: SQLite snapshot store and TOML configuration
//!
//! Every day-level computation goes through one [`Calendar`], and the
//! current instant comes from an injected [`Clock`].

pub mod catalog;
pub mod engine;
pub mod error;
pub mod events;
pub mod notification;
pub mod profile;
pub mod progress;
pub mod sample;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod streak;
pub mod time;

pub use catalog::{Article, Catalog, Exercise, FocusArea, Routine, SortOption, TimeFrame};
pub use engine::Engine;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use notification::{Inbox, Notification, NotificationKind};
pub use profile::{UserProfile, UserSettings, WorkProfile};
pub use progress::{AreaProgress, DailyProgress, WeeklyStats};
pub use schedule::{reminder_times, BreakScheduler, Reminder};
pub use session::{BreakSession, BreakState, ExerciseSession, ExerciseState};
pub use storage::{Config, Database, MemoryStore, SnapshotStore, UserSnapshot};
pub use streak::{Streak, StreakChange, StreakUpdate};
pub use time::{Calendar, Clock, ManualClock, SystemClock};
