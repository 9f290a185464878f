//! ADIF log replay
//!
//! Feeds an exported .adi log through the same normalization and delivery
//! path as live traffic, restamped to the current time, to exercise a
//! dashboard without a radio on the air. Records are spread round-robin
//! over a pool of simulated operators drawn at random from the log itself,
//! with exponentially distributed gaps between sends.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use thiserror::Error;

use crate::adif::split_records;
use crate::contact::{Clock, ContactRecord, Normalizer};
use crate::delivery::RecordSink;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("No valid ADIF records found in {0}")]
    NoRecords(String),
    #[error("Time offset {0} reaches outside the representable date range")]
    OffsetOutOfRange(TimeDelta),
}

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub file: PathBuf,
    /// Mean pause between sends
    pub delay: Duration,
    /// Maximum records to send
    pub limit: usize,
    /// Number of simulated operators
    pub clients: usize,
    /// Subtracted from the current time when restamping
    pub offset: TimeDelta,
}

/// Parse a non-negative number of seconds
pub fn parse_delay(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.trim().parse().map_err(|e| format!("{}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid delay '{}': {}", s, e))
}

/// Parse a non-negative number of hours that still leaves a valid "now minus offset"
pub fn parse_offset_hours(s: &str) -> Result<TimeDelta, String> {
    let hours: f64 = s.trim().parse().map_err(|e| format!("{}", e))?;
    if !hours.is_finite() || hours < 0.0 {
        return Err(format!("expected a non-negative number of hours, got {}", s));
    }

    let millis = hours * 3_600_000.0;
    let offset = if millis < i64::MAX as f64 {
        TimeDelta::try_milliseconds(millis as i64)
    } else {
        None
    };

    match offset {
        Some(offset) if Utc::now().checked_sub_signed(offset).is_some() => Ok(offset),
        _ => Err(format!("offset of {} hours is out of range", s)),
    }
}
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub sent: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Split a log into records and keep the ones that normalize
pub fn load_records<C: Clock>(content: &str, normalizer: &Normalizer<C>) -> Vec<ContactRecord> {
    split_records(content)
        .into_iter()
        .filter_map(|raw| normalizer.normalize(raw).ok())
        .collect()
}

/// Up to `clients` distinct contacted callsigns, picked at random
pub fn operator_pool<R: Rng + ?Sized>(
    records: &[ContactRecord],
    clients: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut calls: Vec<&str> = Vec::new();
    for record in records {
        if !calls.contains(&record.contacted_callsign.as_str()) {
            calls.push(&record.contacted_callsign);
        }
    }

    calls
        .choose_multiple(rng, clients.max(1))
        .map(|call| call.to_string())
        .collect()
}

/// Exponentially distributed pause with the given mean, zero stays zero
pub fn next_delay<R: Rng + ?Sized>(mean: Duration, rng: &mut R) -> Duration {
    if mean.is_zero() {
        return Duration::ZERO;
    }
    match Exp::new(1.0 / mean.as_secs_f64()) {
        Ok(exp) => Duration::try_from_secs_f64(exp.sample(rng)).unwrap_or(mean),
        Err(_) => mean,
    }
}

/// Move a record to `now` and attribute it to `operator`
pub fn restamp(record: &mut ContactRecord, operator: &str, now: DateTime<Utc>) {
    record.callsign = operator.to_string();
    record.operator_callsign = operator.to_string();
    record.qso_date = now.format("%Y-%m-%d").to_string();
    record.time_on = now.format("%H:%M:%S").to_string();
}

fn read_log(path: &Path) -> Result<String, ReplayError> {
    let bytes = std::fs::read(path).map_err(|e| ReplayError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn grid_status(record: &ContactRecord) -> String {
    match (&record.gridsquare, &record.location) {
        (None, _) => "No Grid".to_string(),
        (Some(grid), Some(_)) => format!("Grid {} OK", grid),
        (Some(grid), None) => format!("Grid {} FAIL", grid),
    }
}

/// Replay a log file into `sink`, one delivery attempt per record
pub async fn run_replay<S, C, R>(
    options: &ReplayOptions,
    normalizer: &Normalizer<C>,
    sink: &S,
    clock: &impl Clock,
    rng: &mut R,
) -> Result<ReplaySummary, ReplayError>
where
    S: RecordSink,
    C: Clock,
    R: Rng + ?Sized,
{
    let content = read_log(&options.file)?;
    let records = load_records(&content, normalizer);
    if records.is_empty() {
        return Err(ReplayError::NoRecords(options.file.display().to_string()));
    }

    let pool = operator_pool(&records, options.clients, rng);
    log::info!(
        "Found {} valid records in {}, simulating {} operators: {}",
        records.len(),
        options.file.display(),
        pool.len(),
        pool.iter().take(5).cloned().collect::<Vec<_>>().join(", ")
    );
    log::info!(
        "Sending max {} records with Poisson distribution (mean {:?})...",
        options.limit,
        options.delay
    );

    let mut summary = ReplaySummary::default();

    for (i, mut record) in records.into_iter().enumerate() {
        if summary.sent >= options.limit {
            log::info!("Limit reached.");
            break;
        }

        let operator = &pool[i % pool.len()];
        let now = clock
            .now()
            .checked_sub_signed(options.offset)
            .ok_or(ReplayError::OffsetOutOfRange(options.offset))?;
        restamp(&mut record, operator, now);

        let status = grid_status(&record);
        match sink.deliver(&record).await {
            Ok(()) => {
                summary.succeeded += 1;
                log::info!("[{}] Sent {} ({}) as {}: OK", summary.sent + 1, record.contacted_callsign, status, operator);
            }
            Err(e) => {
                summary.failed += 1;
                log::warn!("[{}] Sent {} ({}) as {}: FAILED ({})", summary.sent + 1, record.contacted_callsign, status, operator, e);
            }
        }
        summary.sent += 1;

        let pause = next_delay(options.delay, rng);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    Ok(summary)
}
