//! The historical dataset: a flat CSV file of already-classified feedback.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use feedpulse_core::schema::{history, missing_columns};
use feedpulse_core::{FeedbackRecord, SentimentLabel, parse_timestamp};
use tracing::{info, warn};

use crate::StoreError;
use crate::table::{get_string, read_csv_batches};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flat-file store of classified feedback records.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file as string-typed batches.
    pub fn read(&self) -> Result<(SchemaRef, Vec<RecordBatch>), StoreError> {
        if !self.path.exists() {
            return Err(StoreError::HistoryNotFound(self.path.clone()));
        }
        read_csv_batches(&self.path)
    }

    /// Records dated `date`. Required columns are checked before filtering.
    pub fn records_on(&self, date: NaiveDate) -> Result<Vec<FeedbackRecord>, StoreError> {
        let (schema, batches) = self.read()?;
        let records = records_from_batches(&schema, &batches, Some(date))?;
        info!(
            %date,
            records = records.len(),
            path = %self.path.display(),
            "loaded historical records"
        );
        Ok(records)
    }

    /// Append classified records, writing the header if the file is new.
    ///
    /// An existing file must carry exactly the history header.
    pub fn append(&self, records: &[FeedbackRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let schema = Arc::new(history::history_schema());
        let batch = records_to_batch(schema.clone(), records)?;

        let existing = self.path.exists() && std::fs::metadata(&self.path)?.len() > 0;
        if existing {
            self.check_header(&schema)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if existing && !ends_with_newline(&self.path)? {
            file.write_all(b"\n")?;
        }
        let mut writer = WriterBuilder::new().with_header(!existing).build(file);
        writer.write(&batch)?;

        info!(records = records.len(), path = %self.path.display(), "appended to history");
        Ok(records.len())
    }

    fn check_header(&self, schema: &Schema) -> Result<(), StoreError> {
        let mut first = String::new();
        BufReader::new(File::open(&self.path)?).read_line(&mut first)?;
        let found = first.trim_end_matches(['\r', '\n']).to_string();
        let expected = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect::<Vec<_>>()
            .join(",");
        if found != expected {
            return Err(StoreError::HeaderMismatch { expected, found });
        }
        Ok(())
    }
}

fn ends_with_newline(path: &Path) -> Result<bool, StoreError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Convert string-typed history batches into records, optionally keeping only
/// rows dated `date`.
///
/// Rows with a blank timestamp, topic group or sentiment are skipped.
/// Row numbers in errors count data rows from 1.
pub fn records_from_batches(
    schema: &Schema,
    batches: &[RecordBatch],
    date: Option<NaiveDate>,
) -> Result<Vec<FeedbackRecord>, StoreError> {
    let names = schema.fields().iter().map(|f| f.name().as_str());
    let missing = missing_columns(names, history::REQUIRED);
    if !missing.is_empty() {
        return Err(StoreError::HistoricalColumnsMissing(missing));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut row_number = 0usize;

    for batch in batches {
        let cell = |name: &str, row: usize| -> Option<String> {
            batch
                .column_by_name(name)
                .and_then(|col| get_string(col.as_ref(), row))
                .map(|s| s.trim().to_string())
                .filter(|s| !is_missing_marker(s))
        };

        for row in 0..batch.num_rows() {
            row_number += 1;

            let Some(raw_ts) = cell(history::TIMESTAMP, row) else {
                skipped += 1;
                continue;
            };
            let timestamp = parse_timestamp(&raw_ts).map_err(|_| StoreError::InvalidTimestamp {
                row: row_number,
                value: raw_ts.clone(),
            })?;
            if date.is_some_and(|d| timestamp.date() != d) {
                continue;
            }

            let (Some(topic_group), Some(raw_sentiment)) =
                (cell(history::TOPIC_GROUP, row), cell(history::SENTIMENT, row))
            else {
                skipped += 1;
                continue;
            };
            let sentiment_label = raw_sentiment.parse::<SentimentLabel>().map_err(|_| {
                StoreError::InvalidSentiment {
                    row: row_number,
                    value: raw_sentiment.clone(),
                }
            })?;

            let sentiment_score = cell(history::SENTIMENT_SCORE, row)
                .map(|v| {
                    v.parse::<f64>().map_err(|_| StoreError::InvalidNumber {
                        row: row_number,
                        column: history::SENTIMENT_SCORE,
                        value: v.clone(),
                    })
                })
                .transpose()?
                .filter(|score| score.is_finite());
            let topic_id = cell(history::TOPIC_ID, row)
                .map(|v| {
                    parse_topic_id(&v).ok_or_else(|| StoreError::InvalidNumber {
                        row: row_number,
                        column: history::TOPIC_ID,
                        value: v.clone(),
                    })
                })
                .transpose()?;

            records.push(FeedbackRecord {
                timestamp,
                remark_text: cell(history::REMARKS, row).unwrap_or_default(),
                topic_id,
                topic_group,
                sentiment_label,
                sentiment_score,
                session: cell(history::SESSION, row),
            });
        }
    }

    if skipped > 0 {
        warn!(skipped, "skipped history rows with blank required cells");
    }
    Ok(records)
}

/// Cell values read as missing: blanks and the usual dataframe NA spellings.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || MISSING_MARKERS.contains(&s)
}

/// Topic ids may have been written as floats (`3.0`) by spreadsheet tools.
fn parse_topic_id(v: &str) -> Option<i64> {
    v.parse::<i64>().ok().or_else(|| {
        v.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn records_to_batch(schema: SchemaRef, records: &[FeedbackRecord]) -> Result<RecordBatch, StoreError> {
    let timestamps: StringArray = records
        .iter()
        .map(|r| Some(r.timestamp.format(TIMESTAMP_FORMAT).to_string()))
        .collect();
    let remarks: StringArray = records.iter().map(|r| Some(r.remark_text.as_str())).collect();
    let topic_ids: Int64Array = records.iter().map(|r| r.topic_id).collect();
    let groups: StringArray = records.iter().map(|r| Some(r.topic_group.as_str())).collect();
    let sentiments: StringArray = records
        .iter()
        .map(|r| Some(r.sentiment_label.as_str()))
        .collect();
    let scores: Float64Array = records.iter().map(|r| r.sentiment_score).collect();
    let sessions: StringArray = records.iter().map(|r| r.session.as_deref()).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(timestamps),
        Arc::new(remarks),
        Arc::new(topic_ids),
        Arc::new(groups),
        Arc::new(sentiments),
        Arc::new(scores),
        Arc::new(sessions),
    ];
    Ok(RecordBatch::try_new(schema, columns)?)
}
