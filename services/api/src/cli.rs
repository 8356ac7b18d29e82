use crate::offline::{
    run_classify, run_join, run_scoring, ClassifyArgs, JoinArgs, ScoringArgs, ScoringStep,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use spk_mahasiswa::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "spk-mahasiswa",
    about = "Student potential classification and SAW applicant ranking",
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
    /// Classify a roster CSV and publish the classified-roster snapshot
    Classify(ClassifyArgs),
    /// Merge an applicant CSV with the classified-roster snapshot
    Join(JoinArgs),
    /// Normalize criterion columns of a scores CSV
    Normalize(ScoringArgs),
    /// Weight, score and rank a normalized scores CSV
    Rank(ScoringArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Classify(args) => run_classify(args),
        Command::Join(args) => run_join(args),
        Command::Normalize(args) => run_scoring(ScoringStep::Normalize, args).await,
        Command::Rank(args) => run_scoring(ScoringStep::Rank, args).await,
    }
}
