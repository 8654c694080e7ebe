use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use crate::drivers::{DashboardError, DataTable};
use crate::types::{TableKind, TIME_COLUMN};
/// One window request: every row of `table` with `start <= RECORDED_TIME <= end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowQuery {
    pub table: TableKind,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}
impl WindowQuery {
    pub fn new(table: TableKind, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { table, start, end }
    }
}
/// Something that can answer window queries. Rows come back newest first.
pub trait DataWindowProvider {
    fn fetch(&self, query: &WindowQuery) -> Result<DataTable, DashboardError>;
}
impl<P: DataWindowProvider + ?Sized> DataWindowProvider for &P {
    fn fetch(&self, query: &WindowQuery) -> Result<DataTable, DashboardError> {
        (**self).fetch(query)
    }
}
/// In-memory source useful for tests and deterministic playback.
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    tables: HashMap<TableKind, DataTable>,
}
impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_table(mut self, kind: TableKind, table: DataTable) -> Self {
        self.insert(kind, table);
        self
    }
    pub fn insert(&mut self, kind: TableKind, table: DataTable) {
        self.tables.insert(kind, table);
    }
}
impl DataWindowProvider for MemoryProvider {
    fn fetch(&self, query: &WindowQuery) -> Result<DataTable, DashboardError> {
        let mut window = match self.tables.get(&query.table) {
            Some(table) => table.filter_range(query.start, query.end),
            None => DataTable::new(query.table.value_columns().iter().copied()),
        };
        window.sort_descending();
        Ok(window)
    }
}
/// Reads `<data_dir>/<TableName>.csv` on every fetch.
#[derive(Clone, Debug)]
pub struct CsvProvider {
    data_dir: PathBuf,
}
impl CsvProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        self.data_dir.join(format!("{}.csv", kind.table_name()))
    }
}
impl DataWindowProvider for CsvProvider {
    fn fetch(&self, query: &WindowQuery) -> Result<DataTable, DashboardError> {
        let path = self.table_path(query.table);
        let text = fs::read_to_string(&path)?;
        let table = parse_csv_table(&text)?;
        for column in query.table.value_columns() {
            table.column_index(column)?;
        }
        let mut window = table.filter_range(query.start, query.end);
        window.sort_descending();
        info!(
            "{}: {} of {} rows in window",
            path.display(),
            window.len(),
            table.len()
        );
        Ok(window)
    }
}
/// Parses a table with a `RECORDED_TIME` column and numeric value columns.
///
/// Rows with the wrong field count, a bad timestamp or a non-numeric value are
/// skipped with a warning; a bad header fails the whole table.
pub fn parse_csv_table(text: &str) -> Result<DataTable, DashboardError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let (_, header) = lines
        .next()
        .ok_or_else(|| DashboardError::Csv("empty file".into()))?;
    let fields: Vec<&str> = header.split(',').map(|f| f.trim().trim_matches('"')).collect();
    let time_idx = fields
        .iter()
        .position(|f| *f == TIME_COLUMN)
        .ok_or(DashboardError::MissingTimeColumn(TIME_COLUMN))?;
    let columns: Vec<&str> = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(_, f)| *f)
        .collect();
    let mut table = DataTable::new(columns.iter().copied());
    let mut skipped = 0usize;
    for (line_no, line) in lines {
        match parse_row(line, fields.len(), time_idx) {
            Ok((time, values)) => table.push_row(time, values)?,
            Err(err) => {
                skipped += 1;
                warn!("skipping csv line {}: {err}", line_no + 1);
            }
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} malformed row(s)");
    }
    Ok(table)
}
fn parse_row(
    line: &str,
    expected: usize,
    time_idx: usize,
) -> Result<(NaiveDateTime, Vec<f64>), DashboardError> {
    let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
    if fields.len() != expected {
        return Err(DashboardError::ColumnCountMismatch {
            expected,
            actual: fields.len(),
        });
    }
    let time = parse_timestamp(fields[time_idx])?;
    let values = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(_, f)| {
            f.parse::<f64>()
                .map_err(|_| DashboardError::Csv(format!("`{f}` is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((time, values))
}
/// Accepts `2024-03-09 12:00:00[.fff]`, the same with a `T`, RFC 3339
/// (converted to its naive UTC time) or a bare date (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DashboardError> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(time);
        }
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| DashboardError::InvalidTimestamp(raw.to_string()))
}
