use chrono::Duration;
use clap::Subcommand;
use refreshx_core::{BreakSession, Event};
use serde::Serialize;

use super::exercise::find_exercise;
use super::{open_engine, parse_instant, print_json};

#[derive(Subcommand)]
pub enum BreakAction {
    /// Record a break that was taken or skipped
    Log {
        /// Scheduled time as HH:MM or RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// Minutes actually spent on the break
        #[arg(long)]
        minutes: Option<u32>,
        /// Exercise id or title done during the break (repeatable)
        #[arg(long = "exercise")]
        exercises: Vec<String>,
        /// Mark the break as skipped
        #[arg(long, conflicts_with_all = ["minutes", "exercises"])]
        skipped: bool,
    },
}

#[derive(Serialize)]
struct Logged<'a> {
    session: &'a BreakSession,
    events: Vec<Event>,
    completed_breaks: u32,
}

pub fn run(action: BreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        BreakAction::Log {
            at,
            minutes,
            exercises,
            skipped,
        } => {
            let now = engine.now();
            let scheduled = match at {
                Some(value) => parse_instant(&value, engine.calendar(), now)?,
                None => now,
            };
            let user = engine.user().ok_or("not signed in")?;
            let planned_min = user.work.break_duration_min();
            let user_id = user.id;

            let mut exercise_ids = Vec::with_capacity(exercises.len());
            for query in &exercises {
                let found = find_exercise(&engine, query)
                    .ok_or_else(|| format!("no exercise matches '{query}'"))?;
                exercise_ids.push(found.id);
            }

            let mut session = BreakSession::new(user_id, scheduled, planned_min * 60, now)?;
            let mut events = Vec::new();
            if skipped {
                events.extend(session.skip(now));
            } else {
                let taken = Duration::minutes(i64::from(minutes.unwrap_or(planned_min)));
                events.extend(session.start(scheduled));
                events.extend(session.end(&exercise_ids, scheduled + taken));
            }

            events.extend(engine.record_break_session(session.clone())?);
            engine.save()?;
            let completed_breaks = engine.today_progress().map_or(0, |p| p.completed_breaks);
            print_json(&Logged {
                session: &session,
                events,
                completed_breaks,
            })?;
        }
    }
    Ok(())
}
