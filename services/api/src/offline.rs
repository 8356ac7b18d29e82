use crate::infra::{open_snapshots, potential_service};
use clap::Args;
use serde::Serialize;
use spk_mahasiswa::config::AppConfig;
use spk_mahasiswa::error::AppError;
use spk_mahasiswa::workflows::saw::{
    CriteriaSource, FileCriteriaSource, HttpCriteriaGateway, LocalOnlySink, ResultSink, SawError,
    SawService, ScoringOutcome,
};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Roster CSV with grades, project and behavioral scores
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Override the snapshot directory (defaults to SPK_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct JoinArgs {
    /// Applicant CSV to merge with the classified roster snapshot
    #[arg(long)]
    pub(crate) applicants: PathBuf,
    /// Override the snapshot directory (defaults to SPK_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoringArgs {
    /// Scores CSV whose criterion columns are named `{group}_{sub_criterion}`
    #[arg(long)]
    pub(crate) scores: PathBuf,
    /// Local criteria JSON; when set nothing is sent to the criteria service
    #[arg(long)]
    pub(crate) criteria: Option<PathBuf>,
    /// Override the snapshot directory (defaults to SPK_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ScoringStep {
    Normalize,
    Rank,
}

fn load_config(data_dir: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    Ok(config)
}

fn print_rows<T: Serialize>(rows: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let config = load_config(args.data_dir)?;
    let snapshots = open_snapshots(&config)?;
    let service = potential_service(&config, snapshots)?;

    let outcome = service.classify(File::open(&args.roster)?)?;
    eprintln!(
        "classified {} students -> {}",
        outcome.snapshot.rows,
        outcome.snapshot.path.display()
    );
    print_rows(&outcome.rows)
}

pub(crate) fn run_join(args: JoinArgs) -> Result<(), AppError> {
    let config = load_config(args.data_dir)?;
    let snapshots = open_snapshots(&config)?;
    let service = potential_service(&config, snapshots)?;

    let merged = service.join_applicants(File::open(&args.applicants)?)?;
    print_rows(&merged)
}

pub(crate) async fn run_scoring(step: ScoringStep, args: ScoringArgs) -> Result<(), AppError> {
    let config = load_config(args.data_dir)?;
    let snapshots = open_snapshots(&config)?;
    let scores = File::open(&args.scores)?;

    let outcome = match args.criteria {
        Some(path) => {
            let service = SawService::new(
                Arc::new(FileCriteriaSource::new(path)),
                Arc::new(LocalOnlySink),
                snapshots,
                config.saw.score_scope,
            );
            score(&service, step, scores).await?
        }
        None => {
            let gateway =
                Arc::new(HttpCriteriaGateway::new(&config.criteria).map_err(SawError::from)?);
            let service = SawService::new(
                Arc::clone(&gateway),
                gateway,
                snapshots,
                config.saw.score_scope,
            );
            score(&service, step, scores).await?
        }
    };

    eprintln!(
        "{} rows, criteria columns [{}] -> {}",
        outcome.rows.len(),
        outcome.criteria_columns.join(", "),
        outcome.snapshot.path.display()
    );
    print_rows(&outcome.rows)
}

async fn score<C, S>(
    service: &SawService<C, S>,
    step: ScoringStep,
    scores: File,
) -> Result<ScoringOutcome, SawError>
where
    C: CriteriaSource + 'static,
    S: ResultSink + 'static,
{
    match step {
        ScoringStep::Normalize => service.normalize(scores).await,
        ScoringStep::Rank => service.rank(scores).await,
    }
}
