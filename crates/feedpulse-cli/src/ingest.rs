//! Ingest pipeline: reads a response export, classifies it, appends to the
//! historical dataset.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use feedpulse_server::classify_responses;
use feedpulse_store::{HistoryStore, read_csv_table, response_rows};

use crate::models::Classifiers;

const CLASSIFY_BATCH_SIZE: usize = 256;

pub struct IngestStats {
    pub total_rows: usize,
    pub appended: usize,
    pub elapsed_secs: f64,
}

/// Run the full ingest pipeline: read CSV → classify → append to history.
///
/// The history is appended to in one write, after every row is classified.
pub fn run_ingest(
    input: &Path,
    history: &HistoryStore,
    classifiers: &Classifiers,
) -> anyhow::Result<IngestStats> {
    let start = Instant::now();

    let table = read_csv_table(input).with_context(|| format!("reading {}", input.display()))?;
    let rows = response_rows(&table, None)?;
    let total_rows = rows.len();
    eprintln!("  Read {total_rows} responses from {}", input.display());

    // Nothing is written until every row is classified, so a failed run
    // leaves the history untouched and can simply be repeated.
    let mut records = Vec::with_capacity(total_rows);
    let mut processed = 0usize;
    for chunk in rows.chunks(CLASSIFY_BATCH_SIZE) {
        records.extend(
            classify_responses(
                chunk,
                &classifiers.topics,
                classifiers.topic_model.as_ref(),
                classifiers.sentiment.as_ref(),
            )
            .context("classifying responses")?,
        );

        processed += chunk.len();
        eprint!(
            "\r  Classified {processed}/{total_rows} ({:.1}%)",
            processed as f64 / total_rows as f64 * 100.0
        );
    }
    if total_rows > 0 {
        eprintln!();
    }

    let appended = history
        .append(&records)
        .with_context(|| format!("appending to {}", history.path().display()))?;

    Ok(IngestStats {
        total_rows,
        appended,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
