//! The import run: header check, per-record savepoints, commit.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use sqlx::{Connection, SqliteConnection, SqlitePool};

use super::header::ColumnMap;
use super::record::MairieRecord;
use super::result::{ImportResult, RecordOutcome};
use super::subscriber::attach_subscriber;
use super::validate::{validate_record, ValidRecord};
use crate::config::{NumericParsing, CSV_DELIMITER};
use crate::error_handling::{ImportError, RecordError};
use crate::storage::{get_department_by_code, insert_import_run, upsert_commune, ImportRunStats};

/// Options of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Create or link a subscriber for every record carrying an email.
    pub create_subscribers: bool,
    pub numeric_parsing: NumericParsing,
    /// Run every step, then roll the transaction back.
    pub dry_run: bool,
    /// Label recorded in the import history.
    pub source: String,
}

/// Imports a semicolon-separated mairie file.
///
/// The header is checked before anything is written: a missing required
/// column fails the run with [`ImportError::MalformedInput`]. Rows are then
/// streamed one by one inside a single transaction. Each record gets its own
/// savepoint, so a record that fails (validation, unknown department, or a
/// storage error while writing its commune or subscriber) is rolled back
/// alone and reported in the result while the run goes on. Nothing is
/// persisted unless the final commit succeeds.
pub async fn import_mairies<R: Read>(
    pool: &SqlitePool,
    reader: R,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError> {
    let mut result = ImportResult::start();
    result.dry_run = options.dry_run;

    let mut csv_reader = ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let header = csv_reader
        .headers()
        .map_err(|e| ImportError::MalformedInput(format!("error reading header: {e}")))?
        .clone();
    let columns = ColumnMap::from_header(&header);
    if let Some(field) = columns.missing_required().first() {
        return Err(ImportError::MalformedInput(format!(
            "required column '{}' not found in CSV",
            field.as_str()
        )));
    }

    log::info!(
        "Importing {} (create_subscribers={}, numeric_parsing={:?}, dry_run={})",
        display_source(&options.source),
        options.create_subscribers,
        options.numeric_parsing,
        options.dry_run
    );

    let mut tx = pool.begin().await?;
    let mut row = StringRecord::new();

    // The header is line 1
    let mut line = 1;
    loop {
        line += 1;
        match csv_reader.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                tx.rollback().await?;
                return Err(ImportError::MalformedInput(format!(
                    "CSV stream unreadable at line {line}: {e}"
                )));
            }
            Err(e) => {
                result.total_records += 1;
                result.record_error(line, RecordError::Unreadable(e));
                continue;
            }
        }
        result.total_records += 1;

        let record = MairieRecord::from_record(&row, &columns);
        if record.is_blank() {
            log::debug!("Line {line}: blank row skipped");
            result.blank_records += 1;
            continue;
        }

        let valid = match validate_record(&record, options.numeric_parsing) {
            Ok(valid) => valid,
            Err(e) => {
                result.record_error(line, e);
                continue;
            }
        };

        let mut savepoint = Connection::begin(&mut *tx).await?;
        match write_record(&mut savepoint, &valid, options.create_subscribers).await {
            Ok(outcome) => {
                savepoint.commit().await?;
                result.record_imported(outcome);
            }
            Err(e) => {
                savepoint.rollback().await?;
                result.record_error(line, e);
            }
        }
    }

    if let Err(e) = result.finish() {
        log::error!("Rolling back import: {e}");
        tx.rollback().await?;
        return Err(e);
    }

    if options.dry_run {
        tx.rollback().await?;
        log::info!(
            "Dry run over {} record(s): {} would be imported, {} error(s); nothing was written",
            result.total_records,
            result.imported_records,
            result.error_records
        );
        return Ok(result);
    }

    insert_import_run(
        &mut tx,
        &ImportRunStats {
            source: &options.source,
            start_time_ms: result.start_time.timestamp_millis(),
            end_time_ms: result.end_time.timestamp_millis(),
            total_records: result.total_records,
            imported_records: result.imported_records,
            skipped_records: result.skipped_records,
            error_records: result.error_records,
            communes_created: result.communes_created,
            communes_updated: result.communes_updated,
            subscribers_created: result.subscribers_created,
            subscribers_linked: result.subscribers_linked,
            create_subscribers: options.create_subscribers,
        },
    )
    .await?;
    tx.commit().await?;

    log::info!(
        "Imported {} of {} record(s) ({} skipped, {} error(s)) in {}",
        result.imported_records,
        result.total_records,
        result.skipped_records,
        result.error_records,
        result.duration
    );
    Ok(result)
}

/// Opens `path` and imports it. An empty `options.source` is replaced by the
/// file name.
pub async fn import_mairies_from_path(
    pool: &SqlitePool,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError> {
    let file = File::open(path)?;
    let mut options = options.clone();
    if options.source.is_empty() {
        options.source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
    }
    import_mairies(pool, file, &options).await
}

fn display_source(source: &str) -> &str {
    if source.is_empty() {
        "CSV input"
    } else {
        source
    }
}

/// Writes one validated record: department check, commune upsert, then the
/// optional subscriber step.
async fn write_record(
    conn: &mut SqliteConnection,
    record: &ValidRecord,
    create_subscribers: bool,
) -> Result<RecordOutcome, RecordError> {
    let department_code = &record.commune.department_code;
    match get_department_by_code(&mut *conn, department_code).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => {
            return Err(RecordError::UnknownDepartment(department_code.clone()))
        }
        Err(e) => return Err(RecordError::Commune(e)),
    }

    let commune = upsert_commune(conn, &record.commune)
        .await
        .map_err(RecordError::Commune)?;

    let subscriber = match (&record.email, create_subscribers) {
        (Some(email), true) => Some(
            attach_subscriber(conn, record, email, commune.id)
                .await
                .map_err(RecordError::Subscriber)?,
        ),
        _ => None,
    };

    Ok(RecordOutcome {
        commune: commune.outcome,
        subscriber,
    })
}
