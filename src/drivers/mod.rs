// src/drivers/mod.rs
pub mod alarm;
pub mod cache;
pub mod error;
pub mod fft;
pub mod pipeline;
pub mod plot;
pub mod series;
pub mod source;
pub mod surface;
pub mod table;
pub use alarm::{check_alarms, AlarmMessage, DEFAULT_ALARM_LIMIT};
pub use cache::{CachedProvider, Clock, SystemClock};
pub use error::DashboardError;
pub use fft::{one_sided_spectrum, SpectrumEstimator, SpectrumResult};
pub use pipeline::{
    make_table, ChannelPanel, DashboardPipeline, DashboardSnapshot, SnapshotSummary,
    SpectrumPanel, SurfacePanel,
};
pub use plot::{
    render_combined_png, render_spectrum_png, render_surface_png, render_time_series_png,
    PlotStyle,
};
pub use series::{SamplePoint, SampledSeries, ScatterPoint3D, ScatterSet3D};
pub use source::{
    parse_csv_table, parse_timestamp, CsvProvider, DataWindowProvider, MemoryProvider,
    WindowQuery,
};
pub use surface::{
    DegenerateReason, SurfaceGrid, SurfaceInterpolator, SurfaceResult, DEFAULT_GRID_SIZE,
    MIN_SURFACE_POINTS,
};
pub use table::{DataRow, DataTable};
