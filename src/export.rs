use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use log::info;
use crate::drivers::{DashboardError, DashboardSnapshot, DataTable};
use crate::types::TableKind;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// Writes `RECORDED_TIME,<columns...>` followed by one line per row, in table order.
pub fn export_table_csv<W: Write>(mut writer: W, table: &DataTable) -> Result<(), DashboardError> {
    writeln!(writer, "{}", table.header().join(","))?;
    for row in table.rows() {
        write!(writer, "{}", row.time.format(TIMESTAMP_FORMAT))?;
        for value in &row.values {
            write!(writer, ",{value}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
/// Both windows of a snapshot in one file, accelerometer first, separated by a blank line.
pub fn export_snapshot_csv(path: impl AsRef<Path>, snapshot: &DashboardSnapshot) -> Result<(), DashboardError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    for (idx, kind) in TableKind::ALL.iter().enumerate() {
        if idx > 0 {
            writeln!(writer)?;
        }
        export_table_csv(&mut writer, snapshot.table(*kind))?;
    }
    writer.flush()?;
    info!(
        "exported {} + {} rows to {}",
        snapshot.accelerometer.len(),
        snapshot.statistics.len(),
        path.display()
    );
    Ok(())
}
