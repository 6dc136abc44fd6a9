use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use flight_risk::error::AppError;

use crate::demo::{
    run_crew_classify, run_demo, run_frat_catalog, run_frat_score, CatalogArgs, CrewClassifyArgs,
    DemoArgs, ScoreArgs,
};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Flight Risk & Compliance Engine",
    about = "Score flight risk assessments, classify crew currency, and track fuel requests",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the FRAT checklist and score selections offline
    Frat {
        #[command(subcommand)]
        command: FratCommand,
    },
    /// Classify crew currency from a roster export
    Crew {
        #[command(subcommand)]
        command: CrewCommand,
    },
    /// Walk one leg through assessment, fuel request, and departure lock
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum FratCommand {
    /// Print the checklist catalog with item weights
    Catalog(CatalogArgs),
    /// Score a set of selected checklist ids
    Score(ScoreArgs),
}

#[derive(Subcommand, Debug)]
enum CrewCommand {
    /// Print a compliance report per crew member in a roster CSV
    Classify(CrewClassifyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override FRAT_CATALOG_PATH
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Frat {
            command: FratCommand::Catalog(args),
        } => run_frat_catalog(args),
        Command::Frat {
            command: FratCommand::Score(args),
        } => run_frat_score(args),
        Command::Crew {
            command: CrewCommand::Classify(args),
        } => run_crew_classify(args),
        Command::Demo(args) => run_demo(args),
    }
}
