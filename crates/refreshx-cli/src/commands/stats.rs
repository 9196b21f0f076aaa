use clap::Subcommand;
use refreshx_core::{FocusArea, TimeFrame};
use serde::Serialize;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's progress
    Today,
    /// This week's rollup
    Week,
    /// Current and longest streak
    Streak,
    /// Daily records, oldest first
    History,
}

#[derive(Serialize)]
struct AreaSummary {
    area: FocusArea,
    completion_percentage: f64,
    today_secs: u64,
    week_secs: u64,
}

#[derive(Serialize)]
struct StreakSummary {
    current: u32,
    longest: u32,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        StatsAction::Today => {
            let areas: Vec<AreaSummary> = [FocusArea::Eye, FocusArea::Back, FocusArea::Wrist]
                .into_iter()
                .map(|area| AreaSummary {
                    area,
                    completion_percentage: engine.completion_percentage(area),
                    today_secs: engine.time_spent(area, TimeFrame::Today),
                    week_secs: engine.time_spent(area, TimeFrame::ThisWeek),
                })
                .collect();
            print_json(&serde_json::json!({
                "progress": engine.today_progress(),
                "areas": areas,
            }))?;
        }
        StatsAction::Week => {
            let stats = engine.refresh_weekly_stats().cloned();
            engine.save()?;
            print_json(&stats)?;
        }
        StatsAction::Streak => {
            let summary = engine.streak().map(|s| StreakSummary {
                current: s.current(),
                longest: s.longest(),
                last_activity: s.last_activity(),
            });
            print_json(&summary)?;
        }
        StatsAction::History => print_json(&engine.daily_history())?,
    }
    Ok(())
}
