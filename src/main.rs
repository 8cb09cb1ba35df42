use anyhow::Result;
use clap::Parser;

use crewdesk::cli::commands::{
    availability::AvailabilityCommand, history::HistoryCommand, init::InitCommand, jobs::JobsCommand,
    seed::SeedCommand, show_how_to_get_work, summary::SummaryCommand, work::WorkCommand,
};
use crewdesk::cli::{Cli, Commands, Toggle};
use crewdesk::config::{config, ObservabilityConfig};
use crewdesk::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let observability = config()
        .map(|c| c.observability.clone())
        .unwrap_or_else(|_| ObservabilityConfig::default());
    init_telemetry(&observability)?;

    tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            // No subcommand: explain what the tool does
            None => show_how_to_get_work().await,
            Some(Commands::Jobs) => JobsCommand::assigned().execute().await,
            Some(Commands::New) => JobsCommand::unseen().execute().await,
            Some(Commands::History { sort, date }) => HistoryCommand::new(sort, date).execute().await,
            Some(Commands::Summary) => SummaryCommand::counts().execute().await,
            Some(Commands::Profile) => SummaryCommand::profile().execute().await,
            Some(Commands::Availability { state }) => {
                AvailabilityCommand::new(state.map(|s| s == Toggle::On)).execute().await
            }
            Some(Commands::Work { booking_id }) => WorkCommand::new(booking_id).execute().await,
            Some(Commands::Init { force }) => InitCommand::new(force).execute().await,
            Some(Commands::Seed { file }) => SeedCommand::new(file).execute().await,
        }
    })
}
