//! Built-in content and first-run state.

use chrono::{DateTime, Duration, Utc};

use crate::catalog::{Article, Catalog, Exercise, FocusArea, Routine};
use crate::error::ValidationError;
use crate::profile::{UserProfile, UserSettings};
use crate::progress::DailyProgress;
use crate::storage::UserSnapshot;
use crate::streak::Streak;
use crate::time::Calendar;

/// The exercises and articles that ship with the app.
///
/// `now` anchors the "added" dates so that sort-by-newest has a stable order.
///
/// # Errors
/// Only if one of the built-in entries fails validation.
pub fn seed_catalog(now: DateTime<Utc>) -> Result<Catalog, ValidationError> {
    let days_ago = |d: i64| now - Duration::days(d);

    let exercises = vec![
        Exercise::new("20-20-20 Rule", 60, FocusArea::Eye, 1.0, days_ago(30))?.with_text(
            "Rest your focus on something far away.",
            "Every 20 minutes look away from the screen. Pick an object about 20 feet away. \
             Hold your gaze on it for 20 seconds while breathing slowly.",
        ),
        Exercise::new("Eye Rotations", 20, FocusArea::Eye, 1.0, days_ago(25))?
            .with_reps(3, 1)
            .with_text(
                "Circle your eyes to loosen the eye muscles.",
                "Keep your head still. Roll your eyes slowly clockwise three times. \
                 Repeat three times counterclockwise.",
            ),
        Exercise::new("Chair Cat-Cow", 30, FocusArea::Back, 2.0, days_ago(20))?
            .with_reps(5, 3)
            .with_text(
                "Alternate rounding and arching the spine while seated.",
                "Sit near the front of the chair. Round your back and tuck your chin. \
                 Arch your back and lift your gaze. Alternate slowly.",
            ),
        Exercise::new("Seated Spinal Twist", 30, FocusArea::Back, 1.5, days_ago(15))?
            .with_reps(1, 2)
            .with_text(
                "Rotate through the torso to ease stiffness.",
                "Sit tall. Put your right hand on your left knee and your left hand behind you. \
                 Turn gently to the left and hold. Switch sides.",
            ),
        Exercise::new("Wrist Flexor Stretch", 15, FocusArea::Wrist, 1.0, days_ago(10))?
            .with_reps(1, 2)
            .with_text(
                "Open up the inside of the forearm.",
                "Hold one arm out palm up. Draw the fingers back with the other hand. \
                 Hold, then switch arms.",
            ),
        Exercise::new("Wrist Rotations", 10, FocusArea::Wrist, 1.0, days_ago(5))?
            .with_reps(10, 2)
            .with_text(
                "Circle the wrists to keep them mobile.",
                "Reach both arms forward with loose fists. Circle the wrists ten times each way.",
            ),
    ];

    let articles = vec![
        Article::new("Simple Habits for Tired Eyes", "Tom Kane", 4, FocusArea::Eye, days_ago(15))?
            .with_body(
                "Everyday ways to keep your eyes comfortable at a screen.",
                "Long screen sessions dry the eyes and tire the focusing muscles. \
                 A cool compress calms puffiness and a warm one helps with dryness. \
                 Drink enough water, sleep seven to eight hours, and look into the distance \
                 every twenty minutes.",
            ),
        Article::new("Desk Setup for a Happier Back", "Aayish Khan", 5, FocusArea::Back, days_ago(10))?
            .with_body(
                "Small adjustments that take load off the spine.",
                "Support the curve of the lower back and keep both feet flat. \
                 Put the top of the monitor at eye level, an arm's length away. \
                 Stand and stretch every half hour no matter how good the chair is.",
            ),
        Article::new("Five Stretches for Busy Wrists", "Grey Top Warriors", 3, FocusArea::Wrist, days_ago(5))?
            .with_body(
                "Keep repetitive strain away with a few minutes a day.",
                "Stretch the flexors palm up and the extensors palm down. \
                 Follow with a prayer stretch, finger fans and wrist circles. \
                 Stop if a stretch turns into pain.",
            ),
    ];

    Ok(Catalog::new(exercises, articles))
}

/// Routine holding the first catalog exercise of every area.
pub fn default_routine(user: &UserProfile, catalog: &Catalog, now: DateTime<Utc>) -> Routine {
    let mut routine = Routine::new(user.id, now);
    for area in FocusArea::ALL {
        if let Some(first) = catalog.exercises_iter().find(|e| e.focus_area == area) {
            routine.add(first.id, area, now);
        }
    }
    routine
}

/// Starting state for a user with nothing stored yet: the built-in catalog,
/// a default routine, zeroed progress for today and an empty streak.
///
/// # Errors
/// Only if the built-in catalog fails validation.
pub fn seed_snapshot(
    user: UserProfile,
    settings: UserSettings,
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> Result<UserSnapshot, ValidationError> {
    let mut catalog = seed_catalog(now)?;
    let routine = default_routine(&user, &catalog, now);
    for id in routine.exercise_ids() {
        if let Some(exercise) = catalog.exercise_mut(*id) {
            exercise.in_routine = true;
        }
    }

    let mut today = DailyProgress::new(user.id, calendar.day_of(now), 0, user.work.breaks_preferred(), now);
    today.set_routine_targets(&routine);
    let streak = Streak::new(user.id, now);

    let mut user = user;
    user.routine_id = Some(routine.id);

    Ok(UserSnapshot {
        user,
        settings,
        catalog,
        routine: Some(routine),
        streak: Some(streak),
        daily_progress: vec![today],
        weekly_stats: None,
        break_sessions: Vec::new(),
        exercise_sessions: Vec::new(),
        notifications: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SortOption;
    use crate::profile::WorkProfile;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 25, 8, 0, 0).unwrap()
    }

    #[test]
    fn catalog_covers_every_body_area() {
        let catalog = seed_catalog(now()).unwrap();
        for area in [FocusArea::Eye, FocusArea::Back, FocusArea::Wrist] {
            assert_eq!(catalog.exercises(Some(area), SortOption::NewestFirst).len(), 2);
            assert_eq!(catalog.articles(Some(area), false, SortOption::NewestFirst).len(), 1);
        }
    }

    #[test]
    fn snapshot_starts_from_zero() {
        let user = UserProfile::new("Sam", WorkProfile::default(), now()).unwrap();
        let settings = UserSettings::new(user.id, now());
        let snap = seed_snapshot(user, settings, &Calendar::utc(), now()).unwrap();

        let routine = snap.routine.as_ref().unwrap();
        assert_eq!(routine.len(), 3);
        assert_eq!(snap.user.routine_id, Some(routine.id));
        assert_eq!(snap.catalog.exercises_iter().filter(|e| e.in_routine).count(), 3);

        let today = &snap.daily_progress[0];
        assert_eq!(today.completed_exercises, 0);
        assert_eq!(today.total_exercises, 3);
        assert_eq!(today.total_breaks, 5);
        assert_eq!(snap.streak.as_ref().unwrap().current(), 0);
        assert!(snap.weekly_stats.is_none());
    }
}
