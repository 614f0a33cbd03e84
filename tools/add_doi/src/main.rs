use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::{info, warn};

use scholardb::importers::{self, crossref, ImportOutcome, ImportStats};
use scholardb::utils::normalize_doi;

/// Crossref asks API users to identify themselves (the "polite pool").
const USER_AGENT: &str = "scholardb/0.1 (mailto:admin@scholardb.example)";

#[derive(Parser, Debug)]
#[command(name = "add_doi")]
#[command(about = "Import publications from Crossref by DOI or from a CSV of DOIs")]
#[command(group(ArgGroup::new("input").required(true).args(["doi", "csv"])))]
struct Args {
    /// The DOI of a single publication to add
    #[arg(long)]
    doi: Option<String>,

    /// Path to a CSV file containing DOIs in a column named "doi"
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Show what would be imported without writing to the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    if args.dry_run {
        info!("DRY RUN - no changes will be made to the database");
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://scholardb.db".to_string());
    let pool = scholardb::db::connect(&database_url)
        .await
        .context("Failed to open database")?;
    scholardb::db::init_schema(&pool).await?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()?;

    let dois = match (&args.doi, &args.csv) {
        (Some(doi), _) => vec![doi.clone()],
        (None, Some(path)) => read_dois_from_csv(path)?,
        (None, None) => unreachable!("clap enforces one input"),
    };

    let mut stats = ImportStats::default();
    for doi in &dois {
        match add_by_doi(&pool, &client, doi, args.dry_run).await {
            Ok(Some(outcome)) => stats.record(&outcome),
            Ok(None) => {}
            Err(e) => {
                warn!("Error adding DOI {}: {:#}", doi, e);
                stats.failed += 1;
            }
        }
    }

    info!(
        "Processed {} DOI(s): {} added, {} skipped, {} failed",
        dois.len(),
        stats.added,
        stats.skipped,
        stats.failed
    );
    Ok(())
}

/// Read DOIs from a CSV file with a column named "doi".
///
/// The parser is deliberately simple: DOIs do not contain commas in
/// practice, and the files this tool sees are single-column exports.
fn read_dois_from_csv(path: &PathBuf) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;
    let mut lines = content.lines();

    let header = lines.next().context("CSV file is empty")?;
    let doi_column = header
        .split(',')
        .position(|column| column.trim().trim_matches('"').eq_ignore_ascii_case("doi"))
        .context("CSV file must contain a column named 'doi'")?;

    Ok(lines
        .filter_map(|line| {
            line.split(',')
                .nth(doi_column)
                .map(|field| field.trim().trim_matches('"').to_string())
        })
        .filter(|doi| !doi.is_empty())
        .collect())
}

/// Import a single publication from the Crossref works API.
///
/// Returns `Ok(None)` when the record was unusable (bad DOI, missing
/// metadata) — those are warned about but not counted as hard failures.
async fn add_by_doi(
    pool: &SqlitePool,
    client: &reqwest::Client,
    raw_doi: &str,
    dry_run: bool,
) -> Result<Option<ImportOutcome>> {
    let Some(doi) = normalize_doi(raw_doi) else {
        warn!("Not a valid DOI: {}", raw_doi);
        return Ok(None);
    };

    info!("Fetching metadata from Crossref for DOI: {}", doi);
    let url = format!("{}/{}", crossref::API_BASE, doi);
    let response = client.get(&url).send().await.context("Failed to fetch URL")?;
    if !response.status().is_success() {
        warn!("Crossref returned {} for DOI {}", response.status(), doi);
        return Ok(None);
    }

    let body: serde_json::Value = response.json().await.context("Failed to parse response")?;
    let Some(record) = crossref::parse_work(&body["message"]) else {
        warn!("No usable metadata for DOI: {}", doi);
        return Ok(None);
    };

    if dry_run {
        if importers::work_exists(pool, &record).await? {
            info!("Already present, would skip: {}", record.title);
        } else {
            info!("Would import: {}", record.title);
            for author in &record.authors {
                info!("  - {} {}", author.first_name, author.last_name);
            }
        }
        return Ok(None);
    }

    let outcome = importers::import_work(pool, &record).await?;
    match &outcome {
        ImportOutcome::Added(_) => info!("Added publication: {}", record.title),
        ImportOutcome::DuplicateDoi(doi) => {
            info!("Publication with DOI {} already exists", doi)
        }
        ImportOutcome::DuplicateTitle(title) => {
            info!("Publication with title '{}' already exists", title)
        }
    }
    Ok(Some(outcome))
}
