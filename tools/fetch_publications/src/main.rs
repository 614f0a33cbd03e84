use anyhow::{Context, Result};
use clap::Parser;
use reqwest::header::ACCEPT;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

use scholardb::importers::{self, crossref, orcid, pubmed, ImportStats, WorkAuthor};
use scholardb::utils::normalize_orcid;

const USER_AGENT: &str = "scholardb/0.1 (mailto:admin@scholardb.example)";

#[derive(Parser, Debug)]
#[command(name = "fetch_publications")]
#[command(about = "Fetch publications from external sources (Crossref, ORCID, PubMed)")]
struct Args {
    /// Source to fetch from: crossref, orcid, pubmed, scopus, or all
    #[arg(long, default_value = "all")]
    source: String,

    /// Author name to search for (Crossref, PubMed)
    #[arg(long)]
    author: Option<String>,

    /// ORCID iD to fetch works for
    #[arg(long)]
    orcid: Option<String>,

    /// Show what would be imported without writing to the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let source = args.source.to_lowercase();
    info!("Fetching publications from {}...", source);
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

    if source == "all" || source == "orcid" {
        match &args.orcid {
            Some(id) => {
                if let Err(e) = fetch_from_orcid(&pool, &client, id, args.dry_run).await {
                    warn!("Error fetching from ORCID: {:#}", e);
                }
            }
            None => warn!("ORCID iD required for ORCID source"),
        }
    }

    if source == "all" || source == "pubmed" {
        match &args.author {
            Some(author) => {
                if let Err(e) = fetch_from_pubmed(&pool, &client, author, args.dry_run).await {
                    warn!("Error fetching from PubMed: {:#}", e);
                }
            }
            None => warn!("Author name required for PubMed source"),
        }
    }

    if source == "all" || source == "crossref" {
        match &args.author {
            Some(author) => {
                if let Err(e) = fetch_from_crossref(&pool, &client, author, args.dry_run).await {
                    warn!("Error fetching from Crossref: {:#}", e);
                }
            }
            None => warn!("Author name required for Crossref source"),
        }
    }

    if source == "all" || source == "scopus" {
        warn!("Scopus API requires an API key and institutional subscription");
        warn!("To enable Scopus integration, configure an API key first");
    }

    info!("Fetching complete!");
    Ok(())
}

/// Crossref free-text author search, newest first.
async fn fetch_from_crossref(
    pool: &SqlitePool,
    client: &reqwest::Client,
    author: &str,
    dry_run: bool,
) -> Result<()> {
    info!("Fetching from Crossref...");

    let body: Value = client
        .get(crossref::API_BASE)
        .query(&[
            ("query.author", author),
            ("rows", "20"),
            ("sort", "published"),
            ("order", "desc"),
        ])
        .send()
        .await
        .context("Failed to query Crossref")?
        .json()
        .await
        .context("Failed to parse Crossref response")?;

    let items = body["message"]["items"].as_array().cloned().unwrap_or_default();
    info!("Found {} works in Crossref", items.len());

    let mut stats = ImportStats::default();
    for item in &items {
        let Some(record) = crossref::parse_work(item) else {
            warn!("Skipping Crossref item without a title");
            continue;
        };
        if dry_run {
            info!("  Would import: {}", record.title);
            continue;
        }
        match importers::import_work(pool, &record).await {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                warn!("Error importing '{}': {:#}", record.title, e);
                stats.failed += 1;
            }
        }
    }

    if !dry_run {
        info!(
            "Crossref: {} added, {} skipped, {} failed",
            stats.added, stats.skipped, stats.failed
        );
    }
    Ok(())
}

/// ORCID works listing plus per-work detail fetches for contributors.
async fn fetch_from_orcid(
    pool: &SqlitePool,
    client: &reqwest::Client,
    raw_id: &str,
    dry_run: bool,
) -> Result<()> {
    info!("Fetching from ORCID...");

    let orcid_id = normalize_orcid(raw_id)
        .with_context(|| format!("Not a valid ORCID iD: {raw_id}"))?;

    let listing: Value = client
        .get(format!("{}/{}/works", orcid::API_BASE, orcid_id))
        .header(ACCEPT, "application/json")
        .send()
        .await
        .context("Failed to query ORCID")?
        .json()
        .await
        .context("Failed to parse ORCID response")?;

    let summaries = orcid::work_summaries(&listing);
    info!("Found {} works in ORCID", summaries.len());

    // The researcher owning the iD authors every listed work; make sure
    // they exist even when a work record carries no contributor list.
    let owner = fetch_owner(client, &orcid_id).await;
    if !dry_run {
        importers::get_or_create_person(pool, &owner).await?;
    }

    let mut stats = ImportStats::default();
    for summary in summaries {
        let Some(mut record) = orcid::parse_work_summary(summary) else {
            warn!("Skipping ORCID work without a title");
            continue;
        };

        if dry_run {
            info!("  Would import: {}", record.title);
            continue;
        }
        if importers::work_exists(pool, &record).await? {
            info!("  Skipping existing publication: {}", record.title);
            stats.skipped += 1;
            continue;
        }

        // Contributors live only in the full work record.
        if let Some(put_code) = orcid::put_code(summary) {
            match fetch_work_detail(client, &orcid_id, put_code).await {
                Ok(detail) => record.authors = orcid::parse_contributors(&detail),
                Err(e) => warn!("  Error fetching contributors: {:#}", e),
            }
        }
        if record.authors.is_empty() {
            record.authors = vec![WorkAuthor {
                corresponding: true,
                ..owner.clone()
            }];
        }

        match importers::import_work(pool, &record).await {
            Ok(outcome) => {
                info!("  Added publication: {}", record.title);
                stats.record(&outcome);
            }
            Err(e) => {
                warn!("  Error importing '{}': {:#}", record.title, e);
                stats.failed += 1;
            }
        }
    }

    if !dry_run {
        info!(
            "ORCID: {} added, {} skipped, {} failed",
            stats.added, stats.skipped, stats.failed
        );
    }
    Ok(())
}

/// Name of the researcher behind an ORCID iD, from the public person
/// record. Falls back to a placeholder on any error — the merge operation
/// can fix names later.
async fn fetch_owner(client: &reqwest::Client, orcid_id: &str) -> WorkAuthor {
    let fallback = WorkAuthor {
        first_name: "Unknown".to_string(),
        last_name: "Author".to_string(),
        orcid: Some(orcid_id.to_string()),
        ..Default::default()
    };

    let response = client
        .get(format!("{}/{}/person", orcid::API_BASE, orcid_id))
        .header(ACCEPT, "application/json")
        .send()
        .await;

    let person: Value = match response {
        Ok(response) => match response.json().await {
            Ok(person) => person,
            Err(_) => return fallback,
        },
        Err(_) => return fallback,
    };

    let given = person["name"]["given-names"]["value"].as_str();
    let family = person["name"]["family-name"]["value"].as_str();
    match (given, family) {
        (_, None) => fallback,
        (given, Some(family)) => WorkAuthor {
            first_name: given.unwrap_or("").to_string(),
            last_name: family.to_string(),
            orcid: Some(orcid_id.to_string()),
            ..Default::default()
        },
    }
}

async fn fetch_work_detail(
    client: &reqwest::Client,
    orcid_id: &str,
    put_code: i64,
) -> Result<Value> {
    client
        .get(format!("{}/{}/work/{}", orcid::API_BASE, orcid_id, put_code))
        .header(ACCEPT, "application/json")
        .send()
        .await
        .context("Failed to fetch work detail")?
        .json()
        .await
        .context("Failed to parse work detail")
}

/// PubMed two-step: esearch for PMIDs, esummary for metadata.
async fn fetch_from_pubmed(
    pool: &SqlitePool,
    client: &reqwest::Client,
    author: &str,
    dry_run: bool,
) -> Result<()> {
    info!("Fetching from PubMed...");

    let term = format!("{author}[Author]");
    let search: Value = client
        .get(pubmed::ESEARCH_URL)
        .query(&[
            ("db", "pubmed"),
            ("term", term.as_str()),
            ("retmode", "json"),
            ("retmax", "100"),
        ])
        .send()
        .await
        .context("Failed to query PubMed esearch")?
        .json()
        .await
        .context("Failed to parse esearch response")?;

    let pmids = pubmed::parse_esearch_ids(&search);
    if pmids.is_empty() {
        info!("No PubMed articles found for this author");
        return Ok(());
    }
    info!("Found {} articles in PubMed", pmids.len());

    let ids = pmids.join(",");
    let summaries: Value = client
        .get(pubmed::ESUMMARY_URL)
        .query(&[("db", "pubmed"), ("id", ids.as_str()), ("retmode", "json")])
        .send()
        .await
        .context("Failed to query PubMed esummary")?
        .json()
        .await
        .context("Failed to parse esummary response")?;

    let mut stats = ImportStats::default();
    for pmid in &pmids {
        let Some(record) = pubmed::parse_esummary(&summaries, pmid) else {
            warn!("  No summary for PMID {}", pmid);
            continue;
        };
        if dry_run {
            info!("  Would import: {}", record.title);
            continue;
        }
        match importers::import_work(pool, &record).await {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                warn!("  Error importing PMID {}: {:#}", pmid, e);
                stats.failed += 1;
            }
        }
    }

    if !dry_run {
        info!(
            "PubMed: {} added, {} skipped, {} failed",
            stats.added, stats.skipped, stats.failed
        );
    }
    Ok(())
}
