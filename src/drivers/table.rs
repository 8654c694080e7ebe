use chrono::NaiveDateTime;
use crate::drivers::{DashboardError, SampledSeries, ScatterSet3D};
use crate::types::{AxisReading, TIME_COLUMN};
/// One row of a source table.
#[derive(Clone, Debug, PartialEq)]
pub struct DataRow {
    pub time: NaiveDateTime,
    pub values: Vec<f64>,
}
/// Timestamped rows with named numeric columns, as returned for one query window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<DataRow>,
}
impl DataTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }
    pub fn push_row(&mut self, time: NaiveDateTime, values: Vec<f64>) -> Result<(), DashboardError> {
        if values.len() != self.columns.len() {
            return Err(DashboardError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(DataRow { time, values });
        Ok(())
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn column_index(&self, name: &str) -> Result<usize, DashboardError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DashboardError::UnknownColumn(name.to_string()))
    }
    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, DashboardError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r.values[idx]).collect())
    }
    /// One column as a series in ascending time order, whatever order the rows came in.
    pub fn series(&self, column: &str) -> Result<SampledSeries, DashboardError> {
        let idx = self.column_index(column)?;
        let series =
            SampledSeries::from_pairs(self.rows.iter().map(|r| (r.time, r.values[idx])));
        Ok(series.sorted())
    }
    pub fn scatter(&self, x: &str, y: &str, z: &str) -> Result<ScatterSet3D, DashboardError> {
        Ok(ScatterSet3D::from_columns(
            &self.column(x)?,
            &self.column(y)?,
            &self.column(z)?,
        ))
    }
    /// Newest row; the first one delivered wins when timestamps tie.
    pub fn latest(&self) -> Option<&DataRow> {
        self.rows
            .iter()
            .reduce(|best, row| if row.time > best.time { row } else { best })
    }
    /// Newest values of three columns, read as x/y/z.
    pub fn latest_reading(&self, columns: [&str; 3]) -> Result<Option<AxisReading>, DashboardError> {
        let [x, y, z] = [
            self.column_index(columns[0])?,
            self.column_index(columns[1])?,
            self.column_index(columns[2])?,
        ];
        Ok(self
            .latest()
            .map(|row| AxisReading::new(row.values[x], row.values[y], row.values[z])))
    }
    /// Rows with `start <= time <= end`.
    pub fn filter_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> DataTable {
        DataTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.time >= start && r.time <= end)
                .cloned()
                .collect(),
        }
    }
    /// Newest first, like the source query's `ORDER BY RECORDED_TIME DESC`.
    pub fn sort_descending(&mut self) {
        self.rows.sort_by(|a, b| b.time.cmp(&a.time));
    }
    /// Header including the time column, for export.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(TIME_COLUMN)
            .chain(self.columns.iter().map(String::as_str))
            .collect()
    }
}
