use super::*;
use crate::storage::MemoryStore;
use crate::time::ManualClock;
use chrono::{NaiveTime, TimeZone};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 25, h, m, 0).unwrap()
}

fn user() -> (UserProfile, UserSettings) {
    let work = WorkProfile::new(
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        5,
        3,
        15,
    )
    .unwrap();
    let user = UserProfile::new("Robin", work, at(7, 0)).unwrap();
    let settings = UserSettings::new(user.id, at(7, 0))
        .with_body(Some(72.0), Some(175.0))
        .unwrap();
    (user, settings)
}

fn engine_at(clock: &ManualClock) -> Engine {
    Engine::new(Calendar::utc(), Box::new(clock.clone()))
}

fn signed_in(clock: &ManualClock) -> Engine {
    let mut engine = engine_at(clock);
    let (user, settings) = user();
    engine.sign_in(user, settings);
    engine
}

fn finished_exercise(engine: &Engine, title: &str, start: DateTime<Utc>, secs: i64) -> ExerciseSession {
    let exercise = engine
        .exercises(None, SortOption::AlphabeticalAz)
        .into_iter()
        .find(|e| e.title == title)
        .unwrap()
        .clone();
    let user_id = engine.user().unwrap().id;
    let mut session =
        ExerciseSession::new(user_id, exercise.id, exercise.title, exercise.focus_area, start).unwrap();
    session.complete(2.0, start + Duration::seconds(secs));
    session
}

#[test]
fn reads_are_empty_when_signed_out() {
    let clock = ManualClock::new(at(10, 0));
    let engine = engine_at(&clock);
    assert!(!engine.is_signed_in());
    assert!(engine.compute_schedule().is_empty());
    assert!(engine.next_break_time().is_none());
    assert_eq!(engine.completion_percentage(FocusArea::Eye), 0.0);
    assert_eq!(engine.time_spent(FocusArea::Back, TimeFrame::ThisWeek), 0);
    assert!(engine.streak().is_none());
    assert!(engine.exercises(None, SortOption::NewestFirst).is_empty());
    assert!(matches!(engine.save(), Err(CoreError::NotSignedIn)));
}

#[test]
fn mutations_require_sign_in() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = engine_at(&clock);
    let brk = BreakSession::new(Uuid::new_v4(), at(11, 0), 300, at(10, 0)).unwrap();
    assert!(matches!(engine.record_break_session(brk), Err(CoreError::NotSignedIn)));
    assert!(matches!(
        engine.update_work_profile(WorkProfile::default()),
        Err(CoreError::NotSignedIn)
    ));
}

#[test]
fn schedule_follows_clock() {
    let clock = ManualClock::new(at(8, 0));
    let engine = signed_in(&clock);
    assert_eq!(engine.compute_schedule(), vec![at(11, 0), at(13, 0), at(15, 0)]);
    clock.set(at(12, 0));
    assert_eq!(engine.next_break_time(), Some(at(13, 0)));
    let reminders = engine.reminders();
    assert_eq!(reminders[0].remind_at, at(12, 55));
    clock.set(at(17, 0));
    assert!(engine.compute_schedule().is_empty());
}

#[test]
fn recording_exercise_updates_progress_and_streak() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let session = finished_exercise(&engine, "Chair Cat-Cow", at(9, 50), 120);
    engine.record_exercise_session(session).unwrap();

    let today = engine.today_progress().unwrap();
    assert_eq!(today.completed_exercises, 1);
    assert_eq!(today.back.time_secs, 120);
    assert_eq!(engine.time_spent(FocusArea::Back, TimeFrame::Today), 120);
    assert_eq!(engine.streak().unwrap().current(), 1);
}

#[test]
fn yesterdays_session_does_not_touch_today() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let session = finished_exercise(&engine, "Eye Rotations", at(10, 0) - Duration::days(1), 60);
    engine.record_exercise_session(session).unwrap();
    assert_eq!(engine.today_progress().unwrap().completed_exercises, 0);
}

#[test]
fn only_completed_breaks_extend_the_streak() {
    let clock = ManualClock::new(at(11, 10));
    let mut engine = signed_in(&clock);
    let user_id = engine.user().unwrap().id;

    let mut skipped = BreakSession::new(user_id, at(11, 0), 300, at(8, 0)).unwrap();
    skipped.skip(at(11, 0));
    engine.record_break_session(skipped).unwrap();
    assert_eq!(engine.streak().unwrap().current(), 0);
    assert_eq!(engine.today_progress().unwrap().completed_breaks, 0);

    let eye = engine.exercises(Some(FocusArea::Eye), SortOption::OldestFirst)[0].id;
    let mut done = BreakSession::new(user_id, at(13, 0), 300, at(8, 0)).unwrap();
    done.start(at(13, 0));
    done.end(&[eye], at(13, 5));
    clock.set(at(13, 6));
    engine.record_break_session(done).unwrap();

    let today = engine.today_progress().unwrap();
    assert_eq!(today.completed_breaks, 1);
    assert_eq!(today.completed_exercises, 1);
    assert_eq!(today.eye.time_secs, 300);
    assert_eq!(engine.streak().unwrap().current(), 1);
    assert_eq!(engine.snapshot().unwrap().break_sessions.len(), 2);
}

#[test]
fn seventh_day_emits_milestone() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let mut milestone = None;
    for day in 0..7 {
        clock.set(at(10, 0) + Duration::days(day));
        let session = finished_exercise(&engine, "Wrist Rotations", clock.now() - Duration::minutes(5), 60);
        if let Some(event) = engine.record_exercise_session(session).unwrap() {
            milestone = Some(event);
        }
    }
    assert!(matches!(milestone, Some(Event::StreakMilestone { days: 7, .. })));
    assert_eq!(engine.daily_history().len(), 7);

    let inbox = engine.notifications(false);
    assert_eq!(inbox.unread_count(), 1);
    assert_eq!(inbox.pending[0].kind, NotificationKind::StreakMilestone);
}

#[test]
fn weekly_rollup_and_time_spent_this_week() {
    // 2025-03-24 is a Monday
    let clock = ManualClock::new(at(10, 0) - Duration::days(1));
    let mut engine = signed_in(&clock);
    let first = finished_exercise(&engine, "Chair Cat-Cow", clock.now(), 100);
    engine.record_exercise_session(first).unwrap();
    clock.set(at(10, 0));
    let second = finished_exercise(&engine, "Chair Cat-Cow", clock.now(), 200);
    engine.record_exercise_session(second).unwrap();

    assert_eq!(engine.time_spent(FocusArea::Back, TimeFrame::ThisWeek), 300);
    let stats = engine.refresh_weekly_stats().unwrap().clone();
    assert_eq!(stats.week_start, NaiveDate::from_ymd_opt(2025, 3, 24).unwrap());
    assert_eq!(stats.total_time_secs, 300);
    assert_eq!(stats.peak_day_date, Some(NaiveDate::from_ymd_opt(2025, 3, 25).unwrap()));
    assert_eq!(stats.streak_days, 2);
    assert_eq!(engine.weekly_stats(), Some(&stats));
}

#[test]
fn routine_toggle_round_trips() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let twist = engine
        .exercises(Some(FocusArea::Back), SortOption::NewestFirst)[0]
        .id;
    assert!(!engine.routine().unwrap().contains(twist));
    assert!(engine.toggle_exercise_in_routine(twist).unwrap());
    assert!(engine.exercise(twist).unwrap().in_routine);
    assert!(!engine.toggle_exercise_in_routine(twist).unwrap());
    assert!(!engine.exercise(twist).unwrap().in_routine);
    assert!(engine.toggle_exercise_in_routine(Uuid::new_v4()).is_err());
}

#[test]
fn article_flags() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let id = engine.articles(None, false, SortOption::ShortestRead)[0].id;
    assert!(engine.toggle_favorite(id).unwrap());
    assert_eq!(engine.articles(None, true, SortOption::NewestFirst).len(), 1);

    engine.mark_article_read(id).unwrap();
    engine.mark_article_read(id).unwrap();
    let article = engine.article(id).unwrap();
    assert!(article.is_read);
    assert_eq!(article.read_by_count, 1);
    assert_eq!(engine.user().unwrap().read_article_ids, vec![id]);
}

#[test]
fn work_profile_update_moves_break_target() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let profile = WorkProfile::new(
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        5,
        7,
        10,
    )
    .unwrap();
    engine.update_work_profile(profile).unwrap();
    assert_eq!(engine.today_progress().unwrap().total_breaks, 7);
    assert_eq!(engine.compute_schedule().len(), 5);
}

#[test]
fn state_survives_sign_out_through_store() {
    let clock = ManualClock::new(at(10, 0));
    let store = MemoryStore::new();
    let (user, settings) = user();

    let mut engine = engine_at(&clock).with_store(Box::new(store.clone()));
    engine.sign_in(user.clone(), settings.clone());
    let session = finished_exercise(&engine, "Eye Rotations", at(9, 55), 60);
    engine.record_exercise_session(session).unwrap();
    engine.save().unwrap();
    engine.sign_out();
    assert!(engine.today_progress().is_none());

    engine.sign_in(user, settings);
    assert_eq!(engine.today_progress().unwrap().completed_exercises, 1);
    assert_eq!(engine.streak().unwrap().current(), 1);
    assert_eq!(store.len(), 1);
}

struct FailingStore;

impl SnapshotStore for FailingStore {
    fn load(&self, _user_id: Uuid) -> Result<Option<UserSnapshot>> {
        Err(CoreError::Database(crate::error::DatabaseError::Locked))
    }

    fn save(&self, _snapshot: &UserSnapshot) -> Result<()> {
        Err(CoreError::Database(crate::error::DatabaseError::Locked))
    }
}

#[test]
fn failing_store_degrades_without_losing_state() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = engine_at(&clock).with_store(Box::new(FailingStore));
    let (user, settings) = user();
    engine.sign_in(user, settings);
    assert!(engine.is_signed_in());
    assert!(!engine.exercises(None, SortOption::NewestFirst).is_empty());

    let session = finished_exercise(&engine, "Eye Rotations", at(9, 55), 60);
    engine.record_exercise_session(session).unwrap();
    assert!(engine.save().is_err());
    assert_eq!(engine.today_progress().unwrap().completed_exercises, 1);
}

#[test]
fn routine_exercise_raises_area_completion() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    assert_eq!(engine.today_progress().unwrap().eye.total, 1);

    let session = finished_exercise(&engine, "20-20-20 Rule", at(9, 50), 60);
    engine.record_exercise_session(session).unwrap();
    assert_eq!(engine.completion_percentage(FocusArea::Eye), 100.0);
    assert_eq!(engine.completion_percentage(FocusArea::Back), 0.0);

    // A lazily created day takes its targets from the routine too
    clock.set(at(10, 0) + Duration::days(1));
    let session = finished_exercise(&engine, "Chair Cat-Cow", clock.now() - Duration::minutes(5), 60);
    engine.record_exercise_session(session).unwrap();
    let today = engine.today_progress().unwrap();
    assert_eq!((today.eye.total, today.back.total, today.wrist.total), (1, 1, 1));
    assert_eq!(engine.completion_percentage(FocusArea::Back), 100.0);
}

#[test]
fn routine_toggle_moves_todays_targets() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let twist = engine
        .exercises(Some(FocusArea::Back), SortOption::NewestFirst)[0]
        .id;
    engine.toggle_exercise_in_routine(twist).unwrap();
    let today = engine.today_progress().unwrap();
    assert_eq!(today.total_exercises, 4);
    assert_eq!(today.back.total, 2);

    engine.toggle_exercise_in_routine(twist).unwrap();
    assert_eq!(engine.today_progress().unwrap().back.total, 1);
}

#[test]
fn recording_the_same_session_twice_counts_once() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let session = finished_exercise(&engine, "Chair Cat-Cow", at(9, 50), 120);
    engine.record_exercise_session(session.clone()).unwrap();
    engine.record_exercise_session(session).unwrap();

    let today = engine.today_progress().unwrap();
    assert_eq!(today.completed_exercises, 1);
    assert_eq!(today.back.time_secs, 120);
    assert_eq!(engine.snapshot().unwrap().exercise_sessions.len(), 1);

    let user_id = engine.user().unwrap().id;
    let mut brk = BreakSession::new(user_id, at(9, 0), 300, at(8, 0)).unwrap();
    brk.start(at(9, 0));
    brk.end(&[], at(9, 5));
    engine.record_break_session(brk.clone()).unwrap();
    engine.record_break_session(brk).unwrap();
    assert_eq!(engine.today_progress().unwrap().completed_breaks, 1);
    assert_eq!(engine.snapshot().unwrap().break_sessions.len(), 1);
}

#[test]
fn finishing_the_routine_leaves_one_goal_notification() {
    let clock = ManualClock::new(at(12, 0));
    let mut engine = signed_in(&clock);
    for (i, title) in ["20-20-20 Rule", "Chair Cat-Cow", "Wrist Flexor Stretch", "Eye Rotations"]
        .into_iter()
        .enumerate()
    {
        let session = finished_exercise(&engine, title, at(9, 0) + Duration::minutes(10 * i as i64), 60);
        engine.record_exercise_session(session).unwrap();
    }
    let goals: Vec<_> = engine
        .notifications(true)
        .pending
        .into_iter()
        .filter(|n| n.kind == NotificationKind::DailyGoalAchieved)
        .collect();
    assert_eq!(goals.len(), 1);
}

#[test]
fn inbox_read_flags() {
    let clock = ManualClock::new(at(10, 0));
    let mut engine = signed_in(&clock);
    let id = engine
        .push_notification(NotificationKind::TipOfTheDay, "Tip of the Day", "Blink often.")
        .unwrap();
    assert_eq!(engine.notifications(false).pending[0].id, id);

    assert!(engine.mark_notification_read(id).unwrap());
    assert!(!engine.mark_notification_read(id).unwrap());
    assert_eq!(engine.notifications(false).unread_count(), 0);
    assert_eq!(engine.notifications(true).read[0].id, id);
    assert!(engine.mark_notification_read(Uuid::new_v4()).is_err());
    assert!(engine
        .push_notification(NotificationKind::TipOfTheDay, "", "Blink often.")
        .is_err());
}
