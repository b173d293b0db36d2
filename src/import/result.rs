//! Import run accumulator.

use std::collections::VecDeque;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::MAX_IMPORT_ERRORS;
use crate::error_handling::ImportError;
use crate::storage::UpsertOutcome;

/// What happened to the subscriber side of a successfully imported record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberOutcome {
    /// A new subscriber was created and linked.
    Created,
    /// An existing subscriber (matched by email) was linked.
    Linked,
}

/// What happened to a successfully imported record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub commune: UpsertOutcome,
    pub subscriber: Option<SubscriberOutcome>,
}

/// Outcome of an import run.
///
/// Threaded through the pipeline by value; each run owns its own.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    /// Data rows read, including unreadable and blank ones.
    pub total_records: usize,
    pub imported_records: usize,
    pub skipped_records: usize,
    pub error_records: usize,
    /// Most recent error messages, at most [`MAX_IMPORT_ERRORS`].
    #[serde(skip_serializing_if = "VecDeque::is_empty")]
    pub errors: VecDeque<String>,
    pub duration: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    pub blank_records: usize,
    pub communes_created: usize,
    pub communes_updated: usize,
    pub subscribers_created: usize,
    pub subscribers_linked: usize,
    /// Set when the run was rolled back on purpose.
    pub dry_run: bool,
}

impl ImportResult {
    /// Starts an empty result, stamped with the current time.
    pub fn start() -> Self {
        let now = Utc::now();
        ImportResult {
            total_records: 0,
            imported_records: 0,
            skipped_records: 0,
            error_records: 0,
            errors: VecDeque::new(),
            duration: String::new(),
            start_time: now,
            end_time: now,
            blank_records: 0,
            communes_created: 0,
            communes_updated: 0,
            subscribers_created: 0,
            subscribers_linked: 0,
            dry_run: false,
        }
    }

    /// Counts a failed record and keeps its message, evicting the oldest
    /// message once the cap is reached.
    pub fn record_error(&mut self, line: usize, error: impl Display) {
        self.error_records += 1;
        if self.errors.len() == MAX_IMPORT_ERRORS {
            self.errors.pop_front();
        }
        let message = format!("Line {line}: {error}");
        log::debug!("{message}");
        self.errors.push_back(message);
    }

    /// Counts a successfully imported record.
    pub fn record_imported(&mut self, outcome: RecordOutcome) {
        self.imported_records += 1;
        match outcome.commune {
            UpsertOutcome::Inserted => self.communes_created += 1,
            UpsertOutcome::Updated => self.communes_updated += 1,
        }
        match outcome.subscriber {
            Some(SubscriberOutcome::Created) => self.subscribers_created += 1,
            Some(SubscriberOutcome::Linked) => self.subscribers_linked += 1,
            None => {}
        }
    }

    /// Stamps the end time and derives the skipped count.
    ///
    /// `imported = (total - blank) - errors` must hold for the counters kept
    /// while reading; any other combination, or a negative intermediate
    /// value, means the counters are corrupt.
    pub fn finish(&mut self) -> Result<(), ImportError> {
        self.end_time = Utc::now();
        self.duration = format!(
            "{:?}",
            (self.end_time - self.start_time)
                .to_std()
                .unwrap_or_default()
        );

        let inconsistent = || ImportError::InconsistentTally {
            total: self.total_records,
            imported: self.imported_records,
            errors: self.error_records,
            blank: self.blank_records,
        };
        let attempted = self
            .total_records
            .checked_sub(self.blank_records)
            .ok_or_else(inconsistent)?;
        let expected_imported = attempted
            .checked_sub(self.error_records)
            .ok_or_else(inconsistent)?;
        if expected_imported != self.imported_records {
            return Err(inconsistent());
        }
        self.skipped_records = self
            .total_records
            .checked_sub(self.imported_records + self.error_records)
            .ok_or_else(inconsistent)?;
        Ok(())
    }
}
