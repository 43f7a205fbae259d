//! Command-line interface for syncing and inspecting tracked documents.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use console::style;
use sqlx::PgPool;

use crate::amendments;
use crate::change_detection;
use crate::config::{PipelineConfig, SyncConfig};
use crate::db;
use crate::documents;
use crate::error::{PipelineError, Result};
use crate::history;
use crate::sync::{sync_document, SyncInput, SyncOutcome};
use crate::version_archive;
use crate::version_diff::diff_versions;

/// SFS Tracker - Track amendments to Swedish statutes.
#[derive(Parser)]
#[command(name = "sfs-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a document to track.
    Register {
        /// SFS number (e.g., "SFS 1977:1160" or 1977:1160)
        document_number: String,

        /// Document title
        #[arg(short, long)]
        title: String,

        /// URL slug
        #[arg(short, long)]
        slug: String,
    },

    /// Sync a fetched snapshot of a document.
    Sync {
        /// SFS number of the document
        document_number: String,

        /// File with the consolidated plain text
        text_file: PathBuf,

        /// File with the HTML rendering
        #[arg(long)]
        html_file: Option<PathBuf>,

        /// Amending law behind this text (e.g., "SFS 2025:732")
        #[arg(short, long)]
        amendment: Option<String>,

        /// Document subtitle (e.g., "t.o.m. SFS 2025:732")
        #[arg(short, long)]
        undertitel: Option<String>,

        /// Publication time of the snapshot (RFC 3339)
        #[arg(long)]
        source_timestamp: Option<DateTime<Utc>>,
    },

    /// Record every amending law cited in the current text.
    Backfill {
        /// SFS number of the document
        document_number: String,
    },

    /// Mark a document as repealed.
    Repeal {
        /// SFS number of the document
        document_number: String,

        /// The repealing law
        #[arg(long)]
        by: Option<String>,
    },

    /// List archived versions, newest first.
    History {
        /// SFS number of the document
        document_number: String,
    },

    /// List recorded change events, newest first.
    Changes {
        /// SFS number of the document
        document_number: String,

        /// Maximum number of events
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },

    /// List amendment records.
    Amendments {
        /// SFS number of the document
        document_number: String,
    },

    /// Amending laws, latest effective date first.
    Timeline {
        /// SFS number of the document
        document_number: String,
    },

    /// Every recorded state of one paragraph, newest first.
    SectionHistory {
        /// SFS number of the document
        document_number: String,

        /// Section number (e.g., "3" or "3 a")
        section: String,

        /// Chapter number
        #[arg(short, long)]
        chapter: Option<String>,
    },

    /// Show the version in force on a date.
    At {
        /// SFS number of the document
        document_number: String,

        /// Date (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Section-level diff between two versions, as JSON.
    Diff {
        /// SFS number of the document
        document_number: String,

        /// Older version number
        #[arg(long)]
        from: i32,

        /// Newer version number
        #[arg(long)]
        to: i32,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::from_env()?;
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Register {
            document_number,
            title,
            slug,
        } => register_command(&pool, &document_number, &title, &slug).await,
        Commands::Sync {
            document_number,
            text_file,
            html_file,
            amendment,
            undertitel,
            source_timestamp,
        } => {
            let mut input = SyncInput::new(
                documents::get_document_by_number(&pool, &document_number)
                    .await?
                    .id,
                read_file(&text_file).await?,
            );
            if let Some(path) = html_file {
                input.html_content = Some(read_file(&path).await?);
            }
            input.amendment_sfs = amendment;
            input.undertitel = undertitel;
            input.source_timestamp = source_timestamp;
            sync_command(&pool, &document_number, input).await
        }
        Commands::Backfill { document_number } => backfill_command(&pool, &document_number).await,
        Commands::Repeal {
            document_number,
            by,
        } => repeal_command(&pool, &document_number, by.as_deref()).await,
        Commands::History { document_number } => history_command(&pool, &document_number).await,
        Commands::Changes {
            document_number,
            limit,
        } => changes_command(&pool, &document_number, limit).await,
        Commands::Amendments { document_number } => {
            amendments_command(&pool, &document_number).await
        }
        Commands::Timeline { document_number } => timeline_command(&pool, &document_number).await,
        Commands::SectionHistory {
            document_number,
            section,
            chapter,
        } => {
            section_history_command(&pool, &document_number, chapter.as_deref(), &section).await
        }
        Commands::At {
            document_number,
            date,
        } => at_command(&pool, &document_number, date).await,
        Commands::Diff {
            document_number,
            from,
            to,
        } => diff_command(&pool, &document_number, from, to).await,
    }
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        PipelineError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {e}", path.display()),
        ))
    })
}

async fn register_command(
    pool: &PgPool,
    document_number: &str,
    title: &str,
    slug: &str,
) -> Result<()> {
    let document = documents::upsert_document(pool, document_number, title, slug).await?;
    println!(
        "{} {} ({})",
        style("Registered").green().bold(),
        style(&document.document_number).cyan(),
        document.id
    );
    Ok(())
}

async fn sync_command(pool: &PgPool, document_number: &str, input: SyncInput) -> Result<()> {
    let sync_config = SyncConfig::from_env()?;

    match sync_document(pool, &sync_config, input).await? {
        SyncOutcome::Created {
            version,
            amendments,
            ..
        } => {
            println!(
                "{} {} as version {}",
                style("Created").green().bold(),
                style(document_number).cyan(),
                version.version_number
            );
            println!("  Amendments recorded: {}", amendments.len());
        }
        SyncOutcome::Updated {
            version,
            event,
            amendment,
        } => {
            println!(
                "{} {} to version {}",
                style("Updated").green().bold(),
                style(document_number).cyan(),
                version.version_number
            );
            if let Some(event) = event {
                println!("  Changed sections: {}", event.changed_sections.join(", "));
            }
            if let Some(amendment) = amendment {
                println!(
                    "  Amendment: {} (effective {})",
                    amendment.amending_sfs_number,
                    amendment
                        .effective_date
                        .map_or_else(|| "unknown".to_string(), |d| d.to_string())
                );
            }
        }
        SyncOutcome::Unchanged => {
            println!(
                "{} {}",
                style("Unchanged").yellow().bold(),
                style(document_number).cyan()
            );
        }
    }
    Ok(())
}

async fn backfill_command(pool: &PgPool, document_number: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    let document = documents::get_document_by_number(&mut *tx, document_number).await?;
    documents::lock_document(&mut *tx, document.id).await?;
    let latest = version_archive::latest_version(&mut *tx, document.id).await?;

    let created = amendments::extract_all_amendments(
        &mut tx,
        document.id,
        &document.full_text,
        latest.map(|v| v.id),
    )
    .await?;
    tx.commit().await?;

    println!(
        "{} {} new amendment record(s) for {}",
        style("Backfilled").green().bold(),
        created.len(),
        style(&document.document_number).cyan()
    );
    for record in created {
        println!("  {} {}", record.amending_sfs_number, record.affected_sections.join(", "));
    }
    Ok(())
}

async fn repeal_command(pool: &PgPool, document_number: &str, by: Option<&str>) -> Result<()> {
    let repealed_by = by.map(str::parse).transpose()?;

    let mut tx = pool.begin().await?;
    let document = documents::get_document_by_number(&mut *tx, document_number).await?;
    change_detection::create_repeal_event(&mut tx, document.id, repealed_by).await?;
    tx.commit().await?;

    println!(
        "{} {}",
        style("Repealed").red().bold(),
        style(&document.document_number).cyan()
    );
    Ok(())
}

async fn history_command(pool: &PgPool, document_number: &str) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let versions = version_archive::get_version_history(pool, document.id).await?;

    println!("{} ({} versions)", style(&document.title).bold(), versions.len());
    for version in versions {
        println!(
            "  v{:<4} {}  {}",
            version.version_number,
            version.created_at.format("%Y-%m-%d %H:%M"),
            version.amendment_sfs.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

async fn changes_command(pool: &PgPool, document_number: &str, limit: i64) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let events = change_detection::get_document_changes(pool, document.id, limit).await?;

    for event in events {
        println!(
            "  {}  {:<10} {}  {}",
            event.detected_at.format("%Y-%m-%d %H:%M"),
            event.change_type,
            event.amendment_sfs.as_deref().unwrap_or("-"),
            event.changed_sections.join(", ")
        );
    }
    Ok(())
}

async fn amendments_command(pool: &PgPool, document_number: &str) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let records = amendments::get_amendments(pool, document.id).await?;

    println!("{} ({} amendments)", style(&document.title).bold(), records.len());
    for record in records {
        println!(
            "  {:<14} {:<10} {}",
            record.amending_sfs_number,
            record
                .effective_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            record.affected_sections.join(", ")
        );
    }
    Ok(())
}

async fn timeline_command(pool: &PgPool, document_number: &str) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let timeline = history::get_amendment_timeline(pool, document.id).await?;

    println!("{} ({} amendments)", style(&document.title).bold(), timeline.len());
    for entry in timeline {
        println!(
            "  {:<10} {:<14} {:>3} section(s)  v{}",
            entry
                .effective_date
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
            entry.amending_sfs_number,
            entry.section_count(),
            entry
                .detected_in_version
                .map_or_else(|| "-".to_string(), |v| v.to_string())
        );
    }
    Ok(())
}

async fn section_history_command(
    pool: &PgPool,
    document_number: &str,
    chapter: Option<&str>,
    section: &str,
) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let entries = history::get_section_history(pool, document.id, chapter, section).await?;

    if entries.is_empty() {
        println!("{}", style("No history for this section").yellow());
        return Ok(());
    }
    for entry in entries {
        let marker = if entry.is_current { "*" } else { " " };
        println!(
            "{marker} v{:<4} {:<9} {}  {}",
            entry.version_number,
            format!("{:?}", entry.change_type).to_lowercase(),
            entry
                .amendment_sfs
                .map_or_else(|| "-".to_string(), |sfs| sfs.to_string()),
            entry
                .effective_date
                .map_or_else(|| "-".to_string(), |d| d.to_string())
        );
    }
    Ok(())
}

async fn at_command(pool: &PgPool, document_number: &str, date: NaiveDate) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let in_force = history::get_version_at_date(pool, document.id, date)
        .await?
        .ok_or(PipelineError::NoVersionAtDate {
            document_id: document.id,
            date,
        })?;

    println!(
        "{} v{} in force on {} (since {})",
        style(&document.document_number).cyan(),
        in_force.version.version_number,
        date,
        in_force
            .effective_from
            .map_or_else(|| "the start".to_string(), |d| d.to_string())
    );
    Ok(())
}

async fn diff_command(pool: &PgPool, document_number: &str, from: i32, to: i32) -> Result<()> {
    let document = documents::get_document_by_number(pool, document_number).await?;
    let diff = diff_versions(pool, document.id, from, to).await?;

    let json = serde_json::to_string_pretty(&diff)
        .map_err(|e| PipelineError::InvalidInput(format!("failed to serialize diff: {e}")))?;
    println!("{json}");
    Ok(())
}
