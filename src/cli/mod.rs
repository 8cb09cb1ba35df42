use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "crewdesk")]
#[command(about = "Staff companion for on-site home service jobs")]
#[command(long_about = "crewdesk lists the jobs assigned to you, walks you through an on-site visit \
                       (start code, before photos, work timer, after photos, end code) and shows \
                       your completed history. Start with 'crewdesk jobs'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Recent,
    Date,
    Name,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List open jobs assigned to you
    Jobs,
    /// List jobs you have not opened yet and mark them as seen
    New,
    /// Show completed jobs
    History {
        /// Sort order for the list
        #[arg(long, value_enum, default_value = "recent", help = "recent, date (oldest first) or name")]
        sort: SortArg,
        /// Only jobs finished on this day (YYYY-MM-DD)
        #[arg(long, help = "Restrict to jobs whose work ended on this day")]
        date: Option<chrono::NaiveDate>,
    },
    /// Show new / assigned / completed counters
    Summary,
    /// Show your staff profile
    Profile,
    /// Show or change whether you are taking jobs
    Availability {
        #[arg(value_enum, help = "Turn availability on or off; omit to show the current value")]
        state: Option<Toggle>,
    },
    /// Run the on-site workflow for one booking
    Work {
        /// Booking id
        booking_id: String,
    },
    /// Write a crewdesk.toml with default settings
    Init {
        /// Overwrite an existing crewdesk.toml
        #[arg(long, help = "Overwrite an existing configuration file")]
        force: bool,
    },
    /// Load bookings into the local backend's data directory
    Seed {
        /// JSON file holding an array of booking rows
        file: PathBuf,
    },
}
