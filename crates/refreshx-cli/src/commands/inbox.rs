use clap::Subcommand;
use uuid::Uuid;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum InboxAction {
    /// Unread notifications, newest first
    List {
        /// Include read notifications
        #[arg(long)]
        all: bool,
    },
    /// Mark a notification as read
    Read { id: Uuid },
}

pub fn run(action: InboxAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    match action {
        InboxAction::List { all } => print_json(&engine.notifications(all))?,
        InboxAction::Read { id } => {
            if engine.mark_notification_read(id)? {
                engine.save()?;
                println!("marked as read");
            } else {
                println!("already read");
            }
        }
    }
    Ok(())
}
