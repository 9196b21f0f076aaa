pub mod breaks;
pub mod catalog;
pub mod config;
pub mod exercise;
pub mod inbox;
pub mod schedule;
pub mod stats;

use chrono::{DateTime, NaiveTime, Utc};
use refreshx_core::{Calendar, Config, Database, Engine, SystemClock, UserProfile};
use uuid::Uuid;

/// kv key holding the id of the local user.
const USER_KEY: &str = "user_id";

/// Open the store, sign the local user in and hand back the engine.
///
/// The user id is created on first use and kept in the database so that
/// every invocation continues the same history.
pub fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let calendar = config.calendar()?;
    let db = Database::open()?;

    let user_id = match db.kv_get(USER_KEY)? {
        Some(id) => Uuid::parse_str(&id)?,
        None => {
            let id = Uuid::new_v4();
            db.kv_set(USER_KEY, &id.to_string())?;
            tracing::info!(user_id = %id, "created local user");
            id
        }
    };

    let mut engine = Engine::new(calendar, Box::new(SystemClock)).with_store(Box::new(db));
    let now = engine.now();
    let mut user = UserProfile::new(config.name.clone(), config.work_profile()?, now)?;
    user.id = user_id;
    let settings = config.settings(user_id, now)?;

    engine.sign_in(user, settings);
    Ok(engine)
}

/// Parse `HH:MM` as a time today, or a full RFC 3339 timestamp.
pub fn parse_instant(
    value: &str,
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(time) = NaiveTime::parse_from_str(value, "%H:%M") {
        return Ok(calendar.at(calendar.day_of(now), time));
    }
    let parsed = DateTime::parse_from_rfc3339(value)
        .map_err(|_| format!("expected HH:MM or an RFC 3339 timestamp, got '{value}'"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_instant_accepts_clock_time_and_rfc3339() {
        let now = Utc.with_ymd_and_hms(2025, 3, 25, 10, 0, 0).unwrap();
        let calendar = Calendar::with_offset_minutes(60).unwrap();
        assert_eq!(
            parse_instant("09:30", &calendar, now).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 25, 8, 30, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2025-03-24T12:00:00Z", &calendar, now).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 24, 12, 0, 0).unwrap()
        );
        assert!(parse_instant("noon", &calendar, now).is_err());
    }
}
