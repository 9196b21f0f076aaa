use chrono::Duration;
use clap::Subcommand;
use refreshx_core::{Engine, Exercise, ExerciseSession};
use serde::Serialize;
use uuid::Uuid;

use super::{open_engine, parse_instant, print_json};

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// Record a finished exercise
    Log {
        /// Exercise id or title
        exercise: String,
        /// Active seconds spent on the exercise
        #[arg(long)]
        duration: u64,
        /// Seconds spent paused
        #[arg(long, default_value_t = 0)]
        paused: u64,
        /// Start time as HH:MM or RFC 3339 (defaults to duration ago)
        #[arg(long)]
        start: Option<String>,
    },
}

#[derive(Serialize)]
struct Logged<'a> {
    session: &'a ExerciseSession,
    event: Option<refreshx_core::Event>,
    streak: u32,
}

pub fn run(action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        ExerciseAction::Log {
            exercise,
            duration,
            paused,
            start,
        } => {
            let found = find_exercise(&engine, &exercise)
                .ok_or_else(|| format!("no exercise matches '{exercise}'"))?
                .clone();
            let now = engine.now();
            let elapsed = i64::try_from(duration + paused)?;
            let start = match start {
                Some(value) => parse_instant(&value, engine.calendar(), now)?,
                None => now - Duration::seconds(elapsed),
            };
            let weight = engine.settings().and_then(|s| s.weight_kg());
            let user_id = engine.user().map(|u| u.id).ok_or("not signed in")?;
            let session = ExerciseSession::finished(
                user_id,
                found.id,
                found.title.clone(),
                found.focus_area,
                start,
                start + Duration::seconds(elapsed),
                paused,
                weight.map_or(0.0, |w| found.calories_burned(w)),
            )?;

            let event = engine.record_exercise_session(session.clone())?;
            engine.save()?;
            let streak = engine.streak().map_or(0, |s| s.current());
            print_json(&Logged {
                session: &session,
                event,
                streak,
            })?;
        }
    }
    Ok(())
}

/// Match on id first, then on a case-insensitive title.
pub(crate) fn find_exercise<'a>(engine: &'a Engine, query: &str) -> Option<&'a Exercise> {
    if let Ok(id) = Uuid::parse_str(query) {
        return engine.exercise(id);
    }
    engine
        .exercises(None, Default::default())
        .into_iter()
        .find(|e| e.title.eq_ignore_ascii_case(query))
}
