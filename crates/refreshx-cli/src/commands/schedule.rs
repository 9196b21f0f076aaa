use clap::Subcommand;
use serde::Serialize;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Remaining breaks for today
    Today,
    /// The next break, if any is left today
    Next,
    /// Reminder times for the remaining breaks
    Reminders,
}

#[derive(Serialize)]
struct NextBreak {
    break_at: chrono::DateTime<chrono::Utc>,
    minutes_until: i64,
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    match action {
        ScheduleAction::Today => print_json(&engine.compute_schedule())?,
        ScheduleAction::Next => match engine.next_break_time() {
            Some(break_at) => print_json(&NextBreak {
                break_at,
                minutes_until: (break_at - engine.now()).num_minutes(),
            })?,
            None => println!("no more breaks today"),
        },
        ScheduleAction::Reminders => print_json(&engine.reminders())?,
    }
    Ok(())
}
