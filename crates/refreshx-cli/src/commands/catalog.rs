use clap::{Subcommand, ValueEnum};
use refreshx_core::{FocusArea, SortOption};
use uuid::Uuid;

use super::{open_engine, print_json};

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Newest,
    Oldest,
    Longest,
    Shortest,
    Az,
    Za,
    LongestRead,
    ShortestRead,
}

impl From<SortArg> for SortOption {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => SortOption::NewestFirst,
            SortArg::Oldest => SortOption::OldestFirst,
            SortArg::Longest => SortOption::LongestDuration,
            SortArg::Shortest => SortOption::ShortestDuration,
            SortArg::Az => SortOption::AlphabeticalAz,
            SortArg::Za => SortOption::AlphabeticalZa,
            SortArg::LongestRead => SortOption::LongestRead,
            SortArg::ShortestRead => SortOption::ShortestRead,
        }
    }
}

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List exercises
    Exercises {
        /// eye, back, wrist or wellness
        #[arg(long)]
        area: Option<FocusArea>,
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortArg,
    },
    /// List articles
    Articles {
        #[arg(long)]
        area: Option<FocusArea>,
        /// Only favorites
        #[arg(long)]
        favorites: bool,
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortArg,
    },
    /// Show the current routine
    Routine,
    /// Add an exercise to the routine, or remove it if already there
    ToggleRoutine { id: Uuid },
    /// Flip an article's favorite flag
    Favorite { id: Uuid },
    /// Mark an article as read
    Read { id: Uuid },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        CatalogAction::Exercises { area, sort } => {
            print_json(&engine.exercises(area, sort.into()))?;
        }
        CatalogAction::Articles {
            area,
            favorites,
            sort,
        } => {
            print_json(&engine.articles(area, favorites, sort.into()))?;
        }
        CatalogAction::Routine => print_json(&engine.routine())?,
        CatalogAction::ToggleRoutine { id } => {
            let added = engine.toggle_exercise_in_routine(id)?;
            engine.save()?;
            println!("{}", if added { "added to routine" } else { "removed from routine" });
        }
        CatalogAction::Favorite { id } => {
            let favorite = engine.toggle_favorite(id)?;
            engine.save()?;
            println!("{}", if favorite { "favorited" } else { "unfavorited" });
        }
        CatalogAction::Read { id } => {
            engine.mark_article_read(id)?;
            engine.save()?;
            println!("marked as read");
        }
    }
    Ok(())
}
