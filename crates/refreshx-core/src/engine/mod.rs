//! The engine facade.
//!
//! [`Engine`] owns the signed-in user's state and wires the scheduler,
//! session recording, streak tracking and progress rollups together. It is an
//! ordinary value built by the host; nothing here is global.
//!
//! Reads never fail: without a signed-in user, or when an aggregate could not
//! be loaded, they return empty or zero values. Mutations return
//! [`CoreError::NotSignedIn`] when there is nobody to record against.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::catalog::{Article, Exercise, FocusArea, Routine, SortOption, TimeFrame};
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::notification::{Inbox, Notification, NotificationKind};
use crate::profile::{UserProfile, UserSettings, WorkProfile};
use crate::progress::{DailyProgress, WeeklyStats};
use crate::sample;
use crate::schedule::{reminder_times, BreakScheduler, Reminder};
use crate::session::{BreakSession, ExerciseSession};
use crate::storage::{SnapshotStore, UserSnapshot};
use crate::streak::{Streak, StreakUpdate};
use crate::time::{Calendar, Clock};

pub struct Engine {
    calendar: Calendar,
    clock: Box<dyn Clock>,
    store: Option<Box<dyn SnapshotStore>>,
    state: Option<UserSnapshot>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("calendar", &self.calendar)
            .field("has_store", &self.store.is_some())
            .field("user", &self.state.as_ref().map(|s| s.user.id))
            .finish()
    }
}

impl Engine {
    pub fn new(calendar: Calendar, clock: Box<dyn Clock>) -> Self {
        Self {
            calendar,
            clock,
            store: None,
            state: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.day_of(self.now())
    }

    // ── Sign-in ──────────────────────────────────────────────────────

    /// Load the user's stored state, or seed a fresh one.
    ///
    /// The given profile and settings replace the stored ones, except for the
    /// read-article list and routine link which only the engine maintains.
    pub fn sign_in(&mut self, user: UserProfile, settings: UserSettings) {
        let now = self.now();
        let stored = match &self.store {
            Some(store) => match store.load(user.id) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "failed to load stored state, starting fresh");
                    None
                }
            },
            None => None,
        };

        let snapshot = match stored {
            Some(mut snap) => {
                let mut user = user;
                user.read_article_ids = std::mem::take(&mut snap.user.read_article_ids);
                user.routine_id = snap.user.routine_id.or(user.routine_id);
                snap.user = user;
                snap.settings = settings;
                tracing::info!(user_id = %snap.user.id, days = snap.daily_progress.len(), "signed in with stored state");
                snap
            }
            None => match sample::seed_snapshot(user.clone(), settings.clone(), &self.calendar, now) {
                Ok(snap) => {
                    tracing::info!(user_id = %snap.user.id, "signed in with fresh state");
                    snap
                }
                Err(e) => {
                    tracing::warn!(user_id = %user.id, error = %e, "seeding failed, starting without catalog");
                    UserSnapshot {
                        user,
                        settings,
                        catalog: Default::default(),
                        routine: None,
                        streak: None,
                        daily_progress: Vec::new(),
                        weekly_stats: None,
                        break_sessions: Vec::new(),
                        exercise_sessions: Vec::new(),
                        notifications: Vec::new(),
                    }
                }
            },
        };
        self.state = Some(snapshot);
    }

    /// Drop everything held for the current user.
    pub fn sign_out(&mut self) {
        if let Some(snap) = self.state.take() {
            tracing::info!(user_id = %snap.user.id, "signed out");
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.state.as_ref().map(|s| &s.user)
    }

    pub fn settings(&self) -> Option<&UserSettings> {
        self.state.as_ref().map(|s| &s.settings)
    }

    pub fn snapshot(&self) -> Option<&UserSnapshot> {
        self.state.as_ref()
    }

    fn state_mut(&mut self) -> Result<&mut UserSnapshot> {
        self.state.as_mut().ok_or(CoreError::NotSignedIn)
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Remaining break times today under the user's work profile.
    pub fn compute_schedule(&self) -> Vec<DateTime<Utc>> {
        match &self.state {
            Some(snap) => BreakScheduler::new(self.calendar).schedule_for(&snap.user.work, self.now()),
            None => Vec::new(),
        }
    }

    pub fn next_break_time(&self) -> Option<DateTime<Utc>> {
        self.compute_schedule().into_iter().next()
    }

    /// Reminder instants for the remaining breaks. Empty when the user has
    /// break reminders switched off.
    pub fn reminders(&self) -> Vec<Reminder> {
        let Some(settings) = self.settings() else {
            return Vec::new();
        };
        if !settings.notifications_enabled || !settings.break_reminders_enabled {
            return Vec::new();
        }
        reminder_times(&self.compute_schedule(), settings.reminders_before_min())
    }

    // ── Recording ────────────────────────────────────────────────────

    /// Count an exercise session toward today and the streak.
    ///
    /// Returns a milestone event when the streak reached one. Re-recording a
    /// session that was already stored as completed changes nothing.
    pub fn record_exercise_session(&mut self, session: ExerciseSession) -> Result<Option<Event>> {
        let now = self.now();
        let calendar = self.calendar;
        let snap = self.state_mut()?;
        let user_id = snap.user.id;

        if snap
            .exercise_sessions
            .iter()
            .any(|s| s.id == session.id && s.is_completed())
        {
            tracing::debug!(session_id = %session.id, "exercise session already counted");
            return Ok(None);
        }

        let idx = progress_index(snap, calendar.day_of(now), now);
        let before = snap.daily_progress[idx].completed_exercises;
        snap.daily_progress[idx].add_completed_exercise(&session, &calendar);
        notify_goal_reached(snap, idx, before, now);

        let update = snap
            .streak
            .get_or_insert_with(|| Streak::new(user_id, now))
            .record_activity(now, &calendar);

        tracing::info!(
            %user_id,
            exercise = %session.exercise_title,
            active_secs = session.active_duration_secs(),
            streak = update.current,
            "exercise session recorded"
        );
        upsert(&mut snap.exercise_sessions, session, |s| s.id);
        Ok(milestone_event(snap, update, now))
    }

    /// Count a break toward today. Only completed breaks extend the streak.
    ///
    /// A break already stored in a terminal state is not counted again.
    pub fn record_break_session(&mut self, session: BreakSession) -> Result<Option<Event>> {
        let now = self.now();
        let calendar = self.calendar;
        let snap = self.state_mut()?;
        let user_id = snap.user.id;
        let weight = snap.settings.weight_kg();

        if snap
            .break_sessions
            .iter()
            .any(|s| s.id == session.id && s.state().is_terminal())
        {
            tracing::debug!(session_id = %session.id, "break session already counted");
            return Ok(None);
        }

        let idx = progress_index(snap, calendar.day_of(now), now);
        let before = snap.daily_progress[idx].completed_exercises;
        snap.daily_progress[idx].add_completed_break(&session, &snap.catalog, weight, &calendar);
        notify_goal_reached(snap, idx, before, now);

        let mut event = None;
        if session.is_completed() {
            let update = snap
                .streak
                .get_or_insert_with(|| Streak::new(user_id, now))
                .record_activity(now, &calendar);
            event = milestone_event(snap, update, now);
        }

        tracing::info!(
            %user_id,
            state = ?session.state(),
            exercises = session.exercises_completed().len(),
            "break session recorded"
        );
        upsert(&mut snap.break_sessions, session, |s| s.id);
        Ok(event)
    }

    // ── Progress reads ───────────────────────────────────────────────

    pub fn today_progress(&self) -> Option<&DailyProgress> {
        let today = self.today();
        self.state
            .as_ref()?
            .daily_progress
            .iter()
            .find(|p| p.date == today)
    }

    /// Every stored day, oldest first.
    pub fn daily_history(&self) -> &[DailyProgress] {
        self.state
            .as_ref()
            .map(|s| s.daily_progress.as_slice())
            .unwrap_or(&[])
    }

    /// Today's completion percentage for `area`, 0 when nothing is recorded.
    pub fn completion_percentage(&self, area: FocusArea) -> f64 {
        self.today_progress()
            .map(|p| p.area_completion_percentage(area))
            .unwrap_or(0.0)
    }

    /// Seconds spent on `area` today or in the current calendar week.
    pub fn time_spent(&self, area: FocusArea, frame: TimeFrame) -> u64 {
        let area_time = |p: &DailyProgress| p.area(area).map_or(0, |a| a.time_secs);
        match frame {
            TimeFrame::Today => self.today_progress().map_or(0, area_time),
            TimeFrame::ThisWeek => {
                let (start, end) = self.current_week();
                self.daily_history()
                    .iter()
                    .filter(|p| (start..=end).contains(&p.date))
                    .map(area_time)
                    .sum()
            }
        }
    }

    pub fn streak(&self) -> Option<&Streak> {
        self.state.as_ref()?.streak.as_ref()
    }

    pub fn weekly_stats(&self) -> Option<&WeeklyStats> {
        self.state.as_ref()?.weekly_stats.as_ref()
    }

    fn current_week(&self) -> (NaiveDate, NaiveDate) {
        let start = self.calendar.week_start_of(self.today());
        (start, start + Duration::days(6))
    }

    /// Recompute this week's rollup from the stored days.
    ///
    /// Growth compares against last week's days; the streak count is the
    /// current streak.
    pub fn refresh_weekly_stats(&mut self) -> Option<&WeeklyStats> {
        let now = self.now();
        let calendar = self.calendar;
        let (start, end) = self.current_week();
        let snap = self.state.as_mut()?;

        let in_range = |from: NaiveDate, to: NaiveDate| -> Vec<DailyProgress> {
            snap.daily_progress
                .iter()
                .filter(|p| (from..=to).contains(&p.date))
                .cloned()
                .collect()
        };
        let this_week = in_range(start, end);
        let last_week = in_range(start - Duration::days(7), start - Duration::days(1));

        let streak_days = snap.streak.as_ref().map_or(0, Streak::current);
        let stats = match WeeklyStats::from_daily_progress(&this_week, &calendar, now) {
            Some(stats) => stats,
            None => WeeklyStats::new(snap.user.id, start, end, now).ok()?,
        };
        let stats = match WeeklyStats::from_daily_progress(&last_week, &calendar, now) {
            Some(previous) => stats.with_previous_week(&previous),
            None => stats,
        };
        snap.weekly_stats = Some(stats.with_streak_days(streak_days));
        snap.weekly_stats.as_ref()
    }

    // ── Catalog ──────────────────────────────────────────────────────

    pub fn exercises(&self, area: Option<FocusArea>, sort: SortOption) -> Vec<&Exercise> {
        self.state
            .as_ref()
            .map(|s| s.catalog.exercises(area, sort))
            .unwrap_or_default()
    }

    pub fn articles(&self, area: Option<FocusArea>, favorites_only: bool, sort: SortOption) -> Vec<&Article> {
        self.state
            .as_ref()
            .map(|s| s.catalog.articles(area, favorites_only, sort))
            .unwrap_or_default()
    }

    pub fn exercise(&self, id: Uuid) -> Option<&Exercise> {
        self.state.as_ref()?.catalog.exercise(id)
    }

    pub fn article(&self, id: Uuid) -> Option<&Article> {
        self.state.as_ref()?.catalog.article(id)
    }

    pub fn routine(&self) -> Option<&Routine> {
        self.state.as_ref()?.routine.as_ref()
    }

    /// Add the exercise to the routine, or remove it if already there.
    ///
    /// Returns whether the exercise is in the routine afterwards.
    /// Today's exercise targets follow the new routine.
    pub fn toggle_exercise_in_routine(&mut self, exercise_id: Uuid) -> Result<bool> {
        let now = self.now();
        let today = self.today();
        let snap = self.state_mut()?;
        let area = snap
            .catalog
            .exercise(exercise_id)
            .map(|e| e.focus_area)
            .ok_or_else(|| unknown_id("exercise_id"))?;

        let user_id = snap.user.id;
        let routine = snap.routine.get_or_insert_with(|| Routine::new(user_id, now));
        snap.user.routine_id = Some(routine.id);

        let in_routine = if routine.contains(exercise_id) {
            routine.remove(exercise_id, area, now);
            false
        } else {
            routine.add(exercise_id, area, now)
        };
        if let Some(day) = snap.daily_progress.iter_mut().find(|p| p.date == today) {
            day.set_routine_targets(routine);
        }
        if let Some(exercise) = snap.catalog.exercise_mut(exercise_id) {
            exercise.in_routine = in_routine;
        }
        Ok(in_routine)
    }

    /// Flip an article's favorite flag; returns the new value.
    pub fn toggle_favorite(&mut self, article_id: Uuid) -> Result<bool> {
        let snap = self.state_mut()?;
        let article = snap
            .catalog
            .article_mut(article_id)
            .ok_or_else(|| unknown_id("article_id"))?;
        article.is_favorite = !article.is_favorite;
        Ok(article.is_favorite)
    }

    /// Mark an article read by the current user. Repeated calls are no-ops.
    pub fn mark_article_read(&mut self, article_id: Uuid) -> Result<()> {
        let snap = self.state_mut()?;
        let article = snap
            .catalog
            .article_mut(article_id)
            .ok_or_else(|| unknown_id("article_id"))?;
        if snap.user.read_article_ids.contains(&article_id) {
            return Ok(());
        }
        article.is_read = true;
        article.read_by_count = article.read_by_count.saturating_add(1);
        snap.user.read_article_ids.push(article_id);
        Ok(())
    }

    // ── Notifications ────────────────────────────────────────────────

    /// Unread notifications, plus read ones when `include_read` is set,
    /// newest first.
    pub fn notifications(&self, include_read: bool) -> Inbox<'_> {
        match &self.state {
            Some(snap) => Inbox::split(&snap.notifications, include_read),
            None => Inbox::default(),
        }
    }

    /// Add a notification to the inbox; returns its id.
    pub fn push_notification(
        &mut self,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> Result<Uuid> {
        let now = self.now();
        let snap = self.state_mut()?;
        let note = Notification::new(snap.user.id, kind, title, message, now)?;
        let id = note.id;
        snap.notifications.push(note);
        Ok(id)
    }

    /// Returns false when the notification was already read.
    pub fn mark_notification_read(&mut self, notification_id: Uuid) -> Result<bool> {
        let snap = self.state_mut()?;
        let note = snap
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| ValidationError::invalid("notification_id", "not in inbox"))?;
        let changed = !note.is_read;
        note.is_read = true;
        Ok(changed)
    }

    // ── Profile ──────────────────────────────────────────────────────

    /// Replace the work profile. Today's break target follows the new
    /// preference.
    pub fn update_work_profile(&mut self, profile: WorkProfile) -> Result<()> {
        let today = self.today();
        let snap = self.state_mut()?;
        if let Some(day) = snap.daily_progress.iter_mut().find(|p| p.date == today) {
            day.total_breaks = profile.breaks_preferred();
        }
        snap.user.work = profile;
        Ok(())
    }

    pub fn update_settings(&mut self, settings: UserSettings) -> Result<()> {
        let snap = self.state_mut()?;
        snap.settings = settings;
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Push the current state to the store.
    ///
    /// A failed save is logged and returned; in-memory state is untouched.
    pub fn save(&self) -> Result<()> {
        let snap = self.state.as_ref().ok_or(CoreError::NotSignedIn)?;
        let Some(store) = &self.store else {
            tracing::debug!("no store configured, nothing to save");
            return Ok(());
        };
        store.save(snap).inspect_err(|e| {
            tracing::warn!(user_id = %snap.user.id, error = %e, "failed to save state");
        })
    }
}

/// Index of the record for `day`, creating it if missing. Records stay sorted
/// by date.
fn progress_index(snap: &mut UserSnapshot, day: NaiveDate, now: DateTime<Utc>) -> usize {
    match snap.daily_progress.binary_search_by_key(&day, |p| p.date) {
        Ok(idx) => idx,
        Err(idx) => {
            let mut record = DailyProgress::new(snap.user.id, day, 0, snap.user.work.breaks_preferred(), now);
            if let Some(routine) = &snap.routine {
                record.set_routine_targets(routine);
            }
            tracing::debug!(%day, "starting daily progress");
            snap.daily_progress.insert(idx, record);
            idx
        }
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, id: impl Fn(&T) -> Uuid) {
    let key = id(&item);
    match items.iter_mut().find(|existing| id(existing) == key) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn milestone_event(snap: &mut UserSnapshot, update: StreakUpdate, at: DateTime<Utc>) -> Option<Event> {
    let days = update.milestone?;
    tracing::info!(days, "streak milestone reached");
    notify(
        snap,
        NotificationKind::StreakMilestone,
        "Streak Milestone",
        &format!("You reached a {days}-day streak."),
        at,
    );
    Some(Event::StreakMilestone { days, at })
}

/// Leave a note the first time today's completed exercises reach the target.
fn notify_goal_reached(snap: &mut UserSnapshot, idx: usize, before: u32, now: DateTime<Utc>) {
    let day = &snap.daily_progress[idx];
    let target = day.total_exercises;
    if target == 0 || before >= target || day.completed_exercises < target {
        return;
    }
    notify(
        snap,
        NotificationKind::DailyGoalAchieved,
        "Daily Goal Achieved",
        "Every exercise in today's routine is done.",
        now,
    );
}

fn notify(snap: &mut UserSnapshot, kind: NotificationKind, title: &str, message: &str, now: DateTime<Utc>) {
    match Notification::new(snap.user.id, kind, title, message, now) {
        Ok(note) => snap.notifications.push(note),
        Err(e) => tracing::warn!(error = %e, "dropping notification"),
    }
}

fn unknown_id(field: &'static str) -> CoreError {
    ValidationError::invalid(field, "not in catalog").into()
}

#[cfg(test)]
mod tests;
