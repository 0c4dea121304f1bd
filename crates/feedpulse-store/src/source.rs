//! Date-based source selection: today's responses come from the live table,
//! earlier (or later) dates from the historical dataset.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use feedpulse_core::schema::live;
use feedpulse_core::{FeedbackRecord, ResponseRow, parse_timestamp};
use tracing::{debug, info};

use crate::history::HistoryStore;
use crate::table::Table;
use crate::StoreError;

/// A provider of the live response table.
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Fetch every response row, header first.
    async fn fetch_table(&self) -> Result<Table, StoreError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Rows for one date, tagged by where they came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// Raw responses that still need classification.
    Live(Vec<ResponseRow>),
    /// Records classified when they were ingested.
    Historical(Vec<FeedbackRecord>),
}

impl Loaded {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Live(rows) => rows.is_empty(),
            Self::Historical(records) => records.is_empty(),
        }
    }
}

#[derive(Clone)]
pub struct DataSource {
    live: Option<Arc<dyn LiveSource>>,
    history: Arc<HistoryStore>,
}

impl DataSource {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            live: None,
            history: Arc::new(history),
        }
    }

    pub fn with_live(mut self, live: Arc<dyn LiveSource>) -> Self {
        self.live = Some(live);
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn live_description(&self) -> Option<String> {
        self.live.as_ref().map(|l| l.describe())
    }

    /// Load the rows dated `selected`.
    pub async fn load(&self, selected: NaiveDate, today: NaiveDate) -> Result<Loaded, StoreError> {
        if selected == today {
            let live = self.live.as_ref().ok_or(StoreError::LiveUnavailable)?;
            let table = live.fetch_table().await?;
            let rows = response_rows(&table, Some(selected))?;
            info!(
                date = %selected,
                fetched = table.len(),
                rows = rows.len(),
                source = %live.describe(),
                "loaded live responses"
            );
            return Ok(Loaded::Live(rows));
        }

        let history = self.history.clone();
        let records = tokio::task::spawn_blocking(move || history.records_on(selected))
            .await
            .map_err(|e| StoreError::Other(format!("history reader task failed: {e}")))??;
        Ok(Loaded::Historical(records))
    }
}

/// Convert a live response table into rows, optionally keeping only those
/// dated `date`. A table without rows is empty regardless of its header.
pub fn response_rows(table: &Table, date: Option<NaiveDate>) -> Result<Vec<ResponseRow>, StoreError> {
    if table.is_empty() {
        return Ok(vec![]);
    }
    let missing = table.missing(live::REQUIRED);
    if !missing.is_empty() {
        return Err(StoreError::LiveColumnsMissing(missing));
    }

    // Required columns were checked above.
    let col = |name: &str| table.column_index(name).unwrap_or(usize::MAX);
    let (ts_col, topic_col, remarks_col) = (
        col(live::TIMESTAMP),
        col(live::TOPIC_TEXT),
        col(live::REMARKS),
    );
    let session_col = table.column_index(live::SESSION);

    let mut rows = Vec::new();
    for i in 0..table.len() {
        let raw_ts = table.cell(i, ts_col).trim();
        if raw_ts.is_empty() {
            debug!(row = i + 1, "skipping response without timestamp");
            continue;
        }
        let timestamp = parse_timestamp(raw_ts).map_err(|_| StoreError::InvalidTimestamp {
            row: i + 1,
            value: raw_ts.to_string(),
        })?;
        if date.is_some_and(|d| timestamp.date() != d) {
            continue;
        }

        rows.push(ResponseRow {
            timestamp,
            topic_text: table.cell(i, topic_col).to_string(),
            remarks: table.cell(i, remarks_col).to_string(),
            session: session_col
                .map(|c| table.cell(i, c).trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Table);

    #[async_trait]
    impl LiveSource for StaticSource {
        async fn fetch_table(&self) -> Result<Table, StoreError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".into()
        }
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn responses() -> Table {
        Table::new(
            strings(&["Timestamp", "Question 11", "REMARKS", "session_name"]),
            vec![
                strings(&["3/1/2024 9:15:02", "More labs", "Great trainer", "RUST-101"]),
                strings(&["3/1/2024 9:20:10", "", "nil", ""]),
                strings(&["2/29/2024 17:00:00", "Wifi", "slow wifi", "RUST-101"]),
                strings(&["", "", "", ""]),
            ],
        )
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn rows_are_filtered_by_date() {
        let rows = response_rows(&responses(), Some(day("2024-03-01"))).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].topic_text, "More labs");
        assert_eq!(rows[0].session.as_deref(), Some("RUST-101"));
        assert_eq!(rows[1].remarks, "nil");
        assert_eq!(rows[1].session, None);

        assert_eq!(response_rows(&responses(), None).unwrap().len(), 3);
    }

    #[test]
    fn day_first_sheet_timestamps_are_read() {
        let table = Table::new(
            strings(&["Timestamp", "Question 11", "REMARKS"]),
            vec![
                strings(&["19/10/2026 14:03:22", "Malayalam", "Clear explanations"]),
                strings(&["18/10/2026 09:00:00", "Pace", "ok"]),
            ],
        );
        let rows = response_rows(&table, Some(day("2026-10-19"))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].remarks, "Clear explanations");
    }

    #[test]
    fn live_columns_are_required() {
        let table = Table::new(strings(&["Timestamp", "REMARKS"]), vec![strings(&["3/1/2024", "ok"])]);
        let err = response_rows(&table, None).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "Required columns missing in live responses");
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        assert!(response_rows(&Table::default(), None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn today_reads_live_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::new(HistoryStore::new(dir.path().join("data.csv")))
            .with_live(Arc::new(StaticSource(responses())));

        let today = day("2024-03-01");
        match source.load(today, today).await.unwrap() {
            Loaded::Live(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected live rows, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_dates_read_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            "TIMESTAMP,topic_group,sentiment\n2024-02-29 10:00:00,Pace,negative\n",
        )
        .unwrap();
        let source = DataSource::new(HistoryStore::new(path));

        let loaded = source.load(day("2024-02-29"), day("2024-03-01")).await.unwrap();
        match loaded {
            Loaded::Historical(records) => assert_eq!(records.len(), 1),
            other => panic!("expected historical records, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn today_without_live_source_is_unavailable() {
        let source = DataSource::new(HistoryStore::new("data.csv"));
        let today = day("2024-03-01");
        let err = source.load(today, today).await.unwrap_err();
        assert!(matches!(err, StoreError::LiveUnavailable));
        assert!(!err.is_structural());
    }
}
