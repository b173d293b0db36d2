//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `commune_targeting` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting (JSON on stdout)
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::process;

use commune_targeting::config::{Command, Opt};
use commune_targeting::export::export_communes;
use commune_targeting::filter::Pagination;
use commune_targeting::import::{import_mairies_from_path, ImportOptions};
use commune_targeting::initialization::{init_database, init_logger_with};
use commune_targeting::storage::{self, DbPool};
use commune_targeting::targeting;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), so
    // COMMUNE_TARGETING_DB_PATH can be set there
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    if let Err(e) = run(opt).await {
        eprintln!("commune_targeting error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn run(opt: Opt) -> Result<()> {
    let pool = init_database(&opt.db_path)
        .await
        .context("Failed to initialize database")?;

    match opt.command {
        Command::Import {
            file,
            create_subscribers,
            numeric_parsing,
            dry_run,
        } => {
            let options = ImportOptions {
                create_subscribers,
                numeric_parsing,
                dry_run,
                source: String::new(),
            };
            let result = import_mairies_from_path(&pool, &file, &options)
                .await
                .with_context(|| format!("Import of {} failed", file.display()))?;
            print_json(&result)
        }
        Command::ImportHistory { limit } => {
            print_json(&storage::query_import_history(&pool, limit).await?)
        }
        Command::Departments => print_json(&storage::list_departments(&pool).await?),
        Command::Department { code } => {
            print_json(&storage::get_department_by_code(pool.as_ref(), &code).await?)
        }
        Command::Communes {
            filter,
            limit,
            offset,
        } => {
            let page = Pagination::general(limit.as_deref(), offset.as_deref());
            let communes = targeting::list_communes_page(&pool, &filter.to_filter()?, page).await?;
            print_json(&communes)
        }
        Command::Commune { insee_code } => print_json(
            &storage::get_commune_by_insee_code(pool.as_ref(), &insee_code).await?,
        ),
        Command::Search { query, limit } => {
            let page = Pagination::search(limit.as_deref());
            print_json(&targeting::search_communes(&pool, &query, page).await?)
        }
        Command::Count { filter } => {
            let count = targeting::count_recipients(&pool, &filter.to_filter()?).await?;
            print_json(&serde_json::json!({ "count": count }))
        }
        Command::Preview { filter } => {
            print_json(&targeting::preview(&pool, &filter.to_filter()?).await?)
        }
        Command::Stats { filter } => {
            print_json(&targeting::statistics(&pool, &filter.to_filter()?).await?)
        }
        Command::Overview => print_json(&targeting::overall_stats(&pool).await?),
        Command::SubscriberCommunes { subscriber_id } => print_json(
            &storage::list_communes_for_subscriber(&pool, subscriber_id).await?,
        ),
        Command::Link {
            subscriber_id,
            commune_id,
        } => {
            let linked = link(&pool, subscriber_id, commune_id).await?;
            print_json(&serde_json::json!({ "linked": linked }))
        }
        Command::Unlink {
            subscriber_id,
            commune_id,
        } => {
            let removed =
                storage::unlink_subscriber_from_commune(&pool, subscriber_id, commune_id).await?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        Command::Export { filter, output } => {
            export_communes(&pool, &filter.to_filter()?, output.as_deref()).await?;
            Ok(())
        }
    }
}

async fn link(pool: &DbPool, subscriber_id: i64, commune_id: i64) -> Result<bool> {
    let mut conn = pool
        .acquire()
        .await
        .context("Failed to acquire database connection")?;
    Ok(storage::link_subscriber_to_commune(&mut conn, subscriber_id, commune_id).await?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
