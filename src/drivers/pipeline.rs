use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::Serialize;
use crate::drivers::alarm::{check_alarms, AlarmMessage, DEFAULT_ALARM_LIMIT};
use crate::drivers::fft::{SpectrumEstimator, SpectrumResult};
use crate::drivers::source::{DataWindowProvider, WindowQuery};
use crate::drivers::surface::{DegenerateReason, SurfaceInterpolator, SurfaceResult};
use crate::drivers::{DataTable, SampledSeries};
use crate::types::{AxisReading, Channel, Quantity, TableKind};
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelPanel {
    pub channel: Channel,
    pub series: SampledSeries,
}
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumPanel {
    pub channel: Channel,
    pub spectrum: SpectrumResult,
}
#[derive(Clone, Debug, PartialEq)]
pub struct SurfacePanel {
    pub quantity: Quantity,
    pub surface: SurfaceResult,
}
/// Everything one refresh produces for the dashboard.
#[derive(Clone, Debug)]
pub struct DashboardSnapshot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub accelerometer: DataTable,
    pub statistics: DataTable,
    pub time_series: Vec<ChannelPanel>,
    pub spectra: Vec<SpectrumPanel>,
    pub surfaces: Vec<SurfacePanel>,
    pub latest: Option<AxisReading>,
    pub alarms: Vec<AlarmMessage>,
}
impl DashboardSnapshot {
    pub fn table(&self, kind: TableKind) -> &DataTable {
        match kind {
            TableKind::Accelerometer => &self.accelerometer,
            TableKind::Statistics => &self.statistics,
        }
    }
    pub fn panel(&self, channel: Channel) -> Option<&ChannelPanel> {
        self.time_series.iter().find(|p| p.channel == channel)
    }
    pub fn surface(&self, quantity: Quantity) -> Option<&SurfacePanel> {
        self.surfaces.iter().find(|p| p.quantity == quantity)
    }
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            start: self.start,
            end: self.end,
            accelerometer_rows: self.accelerometer.len(),
            statistics_rows: self.statistics.len(),
            latest: self.latest,
            alarms: self.alarms.clone(),
            spectra: self
                .spectra
                .iter()
                .map(|p| SpectrumSummary {
                    column: p.channel.column(),
                    bins: p.spectrum.len(),
                    peak_hz: p.spectrum.peak().map(|(f, _)| f),
                    peak_amplitude: p.spectrum.peak().map(|(_, a)| a),
                })
                .collect(),
            surfaces: self
                .surfaces
                .iter()
                .map(|p| match &p.surface {
                    SurfaceResult::Grid(grid) => SurfaceSummary {
                        key: p.quantity.key(),
                        degenerate: None,
                        grid_size: grid.grid_size(),
                        defined_cells: grid.defined_cells(),
                        z_range: grid.z_range(),
                    },
                    SurfaceResult::Degenerate(reason) => SurfaceSummary {
                        key: p.quantity.key(),
                        degenerate: Some(*reason),
                        grid_size: 0,
                        defined_cells: 0,
                        z_range: None,
                    },
                })
                .collect(),
        }
    }
}
/// Serializable overview of a snapshot, written next to the rendered panels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub accelerometer_rows: usize,
    pub statistics_rows: usize,
    pub latest: Option<AxisReading>,
    pub alarms: Vec<AlarmMessage>,
    pub spectra: Vec<SpectrumSummary>,
    pub surfaces: Vec<SurfaceSummary>,
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpectrumSummary {
    pub column: &'static str,
    pub bins: usize,
    pub peak_hz: Option<f64>,
    pub peak_amplitude: Option<f64>,
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SurfaceSummary {
    pub key: &'static str,
    pub degenerate: Option<DegenerateReason>,
    pub grid_size: usize,
    pub defined_cells: usize,
    pub z_range: Option<(f64, f64)>,
}
/// High level pipeline: fetches both tables for a window and derives every panel.
pub struct DashboardPipeline<P: DataWindowProvider> {
    provider: P,
    estimator: SpectrumEstimator,
    interpolator: SurfaceInterpolator,
    alarm_limit: f64,
}
impl<P: DataWindowProvider> DashboardPipeline<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            estimator: SpectrumEstimator::new(),
            interpolator: SurfaceInterpolator::default(),
            alarm_limit: DEFAULT_ALARM_LIMIT,
        }
    }
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.interpolator = SurfaceInterpolator::with_grid_size(grid_size);
        self
    }
    pub fn with_alarm_limit(mut self, limit: f64) -> Self {
        self.alarm_limit = limit;
        self
    }
    pub fn provider(&self) -> &P {
        &self.provider
    }
    pub fn alarm_limit(&self) -> f64 {
        self.alarm_limit
    }
    /// Fetch errors are logged and read as an empty window.
    pub fn fetch_window(&self, table: TableKind, start: NaiveDateTime, end: NaiveDateTime) -> DataTable {
        match self.provider.fetch(&WindowQuery::new(table, start, end)) {
            Ok(window) => window,
            Err(err) => {
                warn!("failed to fetch {}: {err}", table.table_name());
                DataTable::new(table.value_columns())
            }
        }
    }
    /// One dashboard update. `None` when either table has no rows in the window.
    pub fn refresh(&self, start: NaiveDateTime, end: NaiveDateTime) -> Option<DashboardSnapshot> {
        let accelerometer = self.fetch_window(TableKind::Accelerometer, start, end);
        let statistics = self.fetch_window(TableKind::Statistics, start, end);
        if accelerometer.is_empty() || statistics.is_empty() {
            info!(
                "no data between {start} and {end} ({} accelerometer, {} statistics rows)",
                accelerometer.len(),
                statistics.len()
            );
            return None;
        }
        let table_for = |kind: TableKind| match kind {
            TableKind::Accelerometer => &accelerometer,
            TableKind::Statistics => &statistics,
        };
        let time_series: Vec<ChannelPanel> = Channel::all()
            .map(|channel| ChannelPanel {
                channel,
                series: channel_series(table_for(channel.table()), channel),
            })
            .collect();
        let spectra = Quantity::PeakFrequency
            .channels()
            .into_iter()
            .map(|channel| {
                let series = time_series
                    .iter()
                    .find(|p| p.channel == channel)
                    .map(|p| &p.series);
                SpectrumPanel {
                    channel,
                    spectrum: series
                        .map(|s| self.estimator.estimate(s))
                        .unwrap_or_default(),
                }
            })
            .collect();
        let surfaces = Quantity::ALL
            .into_iter()
            .map(|quantity| SurfacePanel {
                quantity,
                surface: self.surface_for(table_for(quantity.table()), quantity),
            })
            .collect();
        let latest = match accelerometer.latest_reading(
            Quantity::Acceleration.channels().map(|c| c.column()),
        ) {
            Ok(reading) => reading,
            Err(err) => {
                warn!("latest reading unavailable: {err}");
                None
            }
        };
        let alarms = latest
            .map(|reading| check_alarms(&reading, self.alarm_limit))
            .unwrap_or_default();
        for alarm in &alarms {
            debug!("alarm: {alarm}");
        }
        Some(DashboardSnapshot {
            start,
            end,
            accelerometer,
            statistics,
            time_series,
            spectra,
            surfaces,
            latest,
            alarms,
        })
    }
    fn surface_for(&self, table: &DataTable, quantity: Quantity) -> SurfaceResult {
        let [x, y, z] = quantity.channels().map(|c| c.column());
        match table.scatter(x, y, z) {
            Ok(points) => self.interpolator.interpolate(&points),
            Err(err) => {
                warn!("{} surface: {err}", quantity.key());
                SurfaceResult::Degenerate(DegenerateReason::InsufficientPoints)
            }
        }
    }
}
fn channel_series(table: &DataTable, channel: Channel) -> SampledSeries {
    table.series(channel.column()).unwrap_or_else(|err| {
        warn!("{}: {err}", channel.title());
        SampledSeries::default()
    })
}
/// Lightweight helper to build a table from `(time, values)` rows.
pub fn make_table(
    kind: TableKind,
    rows: impl IntoIterator<Item = (NaiveDateTime, Vec<f64>)>,
) -> Result<DataTable, crate::drivers::DashboardError> {
    let mut table = DataTable::new(kind.value_columns());
    for (time, values) in rows {
        table.push_row(time, values)?;
    }
    Ok(table)
}
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use crate::drivers::source::{CsvProvider, MemoryProvider};
    use crate::drivers::DashboardError;
    use crate::types::Axis;
    fn t(sec: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap()
            + Duration::seconds(sec)
    }
    fn provider(samples: i64, last_x: f64) -> MemoryProvider {
        let accel = make_table(
            TableKind::Accelerometer,
            (0..samples).map(|i| {
                let x = if i == samples - 1 { last_x } else { (i % 5) as f64 };
                (t(i), vec![x, (i % 7) as f64 * 0.5, 1.0 + (i % 3) as f64])
            }),
        )
        .unwrap();
        let stats = make_table(
            TableKind::Statistics,
            (0..samples).map(|i| {
                let v = i as f64;
                let phase = v * std::f64::consts::PI / 2.0;
                (
                    t(i),
                    vec![
                        v.sin(), v.cos(), (v * 0.3).sin(),
                        (v * 0.7).cos(), (v * 1.3).sin(), v % 4.0,
                        phase.sin(), phase.cos(), (v % 3.0) * 2.0,
                    ],
                )
            }),
        )
        .unwrap();
        MemoryProvider::new()
            .with_table(TableKind::Accelerometer, accel)
            .with_table(TableKind::Statistics, stats)
    }
    /// Serves `inner` except for `broken`, which always fails.
    struct BrokenTable {
        inner: MemoryProvider,
        broken: Option<TableKind>,
    }
    impl DataWindowProvider for BrokenTable {
        fn fetch(&self, query: &WindowQuery) -> Result<DataTable, DashboardError> {
            match self.broken {
                Some(kind) if kind == query.table => {
                    Err(DashboardError::Csv(format!("{} unavailable", kind.table_name())))
                }
                _ => self.inner.fetch(query),
            }
        }
    }
    #[test]
    fn fetch_failures_skip_the_update() {
        let missing = std::env::temp_dir().join(format!("vibemon-missing-{}", std::process::id()));
        let pipeline = DashboardPipeline::new(CsvProvider::new(&missing));
        assert!(pipeline.fetch_window(TableKind::Accelerometer, t(0), t(9)).is_empty());
        assert!(pipeline.refresh(t(0), t(9)).is_none());
        for kind in TableKind::ALL {
            let pipeline = DashboardPipeline::new(BrokenTable {
                inner: provider(20, 0.0),
                broken: Some(kind),
            })
            .with_grid_size(10);
            assert!(pipeline.refresh(t(0), t(19)).is_none(), "{kind:?} failing");
        }
        let healthy = DashboardPipeline::new(BrokenTable {
            inner: provider(20, 0.0),
            broken: None,
        })
        .with_grid_size(10);
        assert!(healthy.refresh(t(0), t(19)).is_some());
    }
    #[test]
    fn empty_window_skips_the_update() {
        let pipeline = DashboardPipeline::new(provider(20, 0.0));
        assert!(pipeline.refresh(t(100), t(200)).is_none());
        let only_accel = MemoryProvider::new().with_table(
            TableKind::Accelerometer,
            make_table(TableKind::Accelerometer, [(t(0), vec![1.0, 2.0, 3.0])]).unwrap(),
        );
        assert!(DashboardPipeline::new(only_accel).refresh(t(0), t(10)).is_none());
    }
    #[test]
    fn refresh_builds_every_panel() {
        let pipeline = DashboardPipeline::new(provider(40, 2.0)).with_grid_size(20);
        let snapshot = pipeline.refresh(t(0), t(39)).unwrap();
        assert_eq!(snapshot.time_series.len(), 12);
        assert!(snapshot.time_series.iter().all(|p| p.series.len() == 40));
        assert!(snapshot.time_series.iter().all(|p| p.series.is_ascending()));
        assert_eq!(snapshot.spectra.len(), 3);
        // 40 samples one second apart
        assert!(snapshot.spectra.iter().all(|p| p.spectrum.len() == 21));
        assert_eq!(snapshot.spectra[0].channel.column(), "PEAK_FREQ_X");
        assert_eq!(snapshot.surfaces.len(), 4);
        let xyz = snapshot.surface(Quantity::Acceleration).unwrap();
        assert_eq!(xyz.surface.grid().map(|g| g.grid_size()), Some(20));
        assert_eq!(snapshot.latest, Some(AxisReading::new(2.0, 2.0, 1.0)));
        assert!(snapshot.alarms.is_empty());
    }
    #[test]
    fn window_bounds_are_inclusive() {
        let pipeline = DashboardPipeline::new(provider(30, 0.0)).with_grid_size(10);
        let snapshot = pipeline.refresh(t(5), t(14)).unwrap();
        assert_eq!(snapshot.accelerometer.len(), 10);
        let panel = snapshot.panel(Channel::new(Quantity::Acceleration, Axis::X)).unwrap();
        assert_eq!(panel.series.first().map(|p| p.time), Some(t(5)));
        assert_eq!(panel.series.last().map(|p| p.time), Some(t(14)));
    }
    #[test]
    fn latest_reading_raises_alarms() {
        let pipeline = DashboardPipeline::new(provider(20, -12.0)).with_alarm_limit(9.0);
        let snapshot = pipeline.refresh(t(0), t(19)).unwrap();
        assert_eq!(snapshot.alarms.len(), 1);
        assert_eq!(snapshot.alarms[0].axis, Axis::X);
        let quiet = DashboardPipeline::new(provider(20, -12.0)).with_alarm_limit(20.0);
        assert!(quiet.refresh(t(0), t(19)).unwrap().alarms.is_empty());
    }
    #[test]
    fn degenerate_surfaces_do_not_block_the_refresh() {
        let pipeline = DashboardPipeline::new(provider(3, 0.0));
        let snapshot = pipeline.refresh(t(0), t(2)).unwrap();
        assert!(snapshot.surfaces.iter().all(|p| p.surface.is_degenerate()));
        let summary = snapshot.summary();
        assert_eq!(summary.surfaces.len(), 4);
        assert_eq!(
            summary.surfaces[0].degenerate,
            Some(DegenerateReason::InsufficientPoints)
        );
        assert_eq!(summary.accelerometer_rows, 3);
        assert!(serde_json::to_string(&summary).is_ok());
    }
}
