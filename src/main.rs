// src/main.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use anyhow::{bail, Context, Result};
use std::time::Duration;
use chrono::{DurationRound, Local, NaiveDate, NaiveDateTime};
use clap::Parser;
use log::{info, warn};
use vibemon::drivers::{
    parse_timestamp, render_combined_png, render_spectrum_png, render_surface_png,
    render_time_series_png, CachedProvider, CsvProvider, DashboardPipeline, DashboardSnapshot,
    PlotStyle,
};
use vibemon::export::export_snapshot_csv;
use vibemon::types::{Quantity, SpectrumStyle};
use vibemon::DashboardConfig;
#[derive(Parser, Debug)]
#[command(name = "vibemon")]
#[command(about = "Render accelerometer spectra, surfaces and alarms for a time window")]
struct Args {
    /// JSON config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory with AccelerometerData.csv and StatisticsData.csv
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,
    /// Window start (date or timestamp); defaults to today's midnight
    #[arg(long)]
    start: Option<String>,
    /// Window end (date or timestamp); a bare date covers the whole day
    #[arg(long)]
    end: Option<String>,
    /// Output directory for PNGs, snapshot.json and data.csv
    #[arg(long, default_value = "out")]
    out: PathBuf,
    /// Repeat the refresh every `refresh_interval_secs`
    #[arg(long)]
    watch: bool,
    /// Skip captions and axis labels (no system font needed)
    #[arg(long = "no-annotations")]
    no_annotations: bool,
}
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate()?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let mut style = config.plot_style();
    if args.no_annotations {
        style = style.without_annotations();
    }
    let provider = CachedProvider::new(
        CsvProvider::new(&config.data_dir),
        config.cache_ttl(),
        config.cache_capacity,
    );
    let pipeline = DashboardPipeline::new(provider)
        .with_grid_size(config.grid_size)
        .with_alarm_limit(config.alarm_limit);
    info!(
        "reading {} (grid {}, alarm limit ±{})",
        config.data_dir.display(),
        config.grid_size,
        config.alarm_limit
    );
    loop {
        let (start, end) = resolve_window(
            args.start.as_deref(),
            args.end.as_deref(),
            Local::now().naive_local(),
            config.cache_ttl(),
        )?;
        match pipeline.refresh(start, end) {
            Some(snapshot) => {
                for alarm in &snapshot.alarms {
                    warn!("ALARM: {alarm}");
                }
                write_outputs(&snapshot, &args.out, &style, config.spectrum_style)?;
            }
            None => info!("nothing to update for {start} .. {end}"),
        }
        if !args.watch {
            break;
        }
        thread::sleep(config.refresh_interval());
    }
    Ok(())
}
/// Window for one refresh. An open end is `now` cut down to a multiple of
/// `step`, so consecutive ticks inside one cache period ask for the same window.
fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    now: NaiveDateTime,
    step: Duration,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start = match start {
        Some(raw) => parse_timestamp(raw)?,
        None => now.date().and_hms_opt(0, 0, 0).unwrap_or(now),
    };
    let end = match end {
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(day) => day
                .and_hms_nano_opt(23, 59, 59, 999_999_999)
                .context("end of day")?,
            Err(_) => parse_timestamp(raw)?,
        },
        None => chrono::Duration::from_std(step)
            .ok()
            .filter(|step| *step > chrono::Duration::zero())
            .and_then(|step| now.duration_trunc(step).ok())
            .unwrap_or(now)
            .max(start),
    };
    if end < start {
        bail!("window end {end} is before start {start}");
    }
    Ok((start, end))
}
fn write_outputs(
    snapshot: &DashboardSnapshot,
    out: &Path,
    style: &PlotStyle,
    spectrum_style: SpectrumStyle,
) -> Result<()> {
    let mut written = 0usize;
    for panel in &snapshot.time_series {
        let path = out.join(format!("timeseries_{}.png", panel.channel.column()));
        written += save_png(&path, render_time_series_png(&panel.series, &panel.channel.title(), style));
    }
    for panel in &snapshot.spectra {
        let path = out.join(format!("spectrum_{}.png", panel.channel.column()));
        let title = format!("FFT of {}", panel.channel.column());
        written += save_png(
            &path,
            render_spectrum_png(&panel.spectrum, &title, spectrum_style, style),
        );
    }
    for panel in &snapshot.surfaces {
        let path = out.join(format!("surface_{}.png", panel.quantity.key()));
        match panel.surface.grid() {
            Some(grid) => {
                written += save_png(
                    &path,
                    render_surface_png(grid, panel.quantity.surface_title(), style),
                )
            }
            None => warn!("{}: not enough data for a surface", panel.quantity.surface_title()),
        }
    }
    for quantity in Quantity::ALL {
        let titles: Vec<String> = quantity.channels().iter().map(|c| c.title()).collect();
        let panels: Vec<(&str, &_)> = quantity
            .channels()
            .iter()
            .zip(&titles)
            .filter_map(|(c, title)| snapshot.panel(*c).map(|p| (title.as_str(), &p.series)))
            .collect();
        let path = out.join(format!("combined_{}.png", quantity.key()));
        let wide = PlotStyle {
            width: style.width * 3 / 2,
            ..style.clone()
        };
        written += save_png(&path, render_combined_png(&panels, &wide));
    }
    let summary = serde_json::to_string_pretty(&snapshot.summary())?;
    fs::write(out.join("snapshot.json"), summary)?;
    export_snapshot_csv(out.join("data.csv"), snapshot)?;
    info!(
        "{} .. {}: {} panels written to {}",
        snapshot.start,
        snapshot.end,
        written,
        out.display()
    );
    Ok(())
}
fn save_png(path: &Path, png: Result<Vec<u8>, vibemon::drivers::DashboardError>) -> usize {
    match png.map(|bytes| fs::write(path, bytes)) {
        Ok(Ok(())) => 1,
        Ok(Err(err)) => {
            warn!("failed to write {}: {err}", path.display());
            0
        }
        Err(err) => {
            warn!("skipping {}: {err}", path.display());
            0
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn at(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }
    #[test]
    fn open_end_repeats_within_a_cache_period() {
        let ttl = Duration::from_secs(180);
        let first = resolve_window(None, None, at("2024-03-09 08:01:10"), ttl).unwrap();
        let second = resolve_window(None, None, at("2024-03-09 08:02:50"), ttl).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, (at("2024-03-09"), at("2024-03-09 08:00:00")));
        let later = resolve_window(None, None, at("2024-03-09 08:03:00"), ttl).unwrap();
        assert_eq!(later.1, at("2024-03-09 08:03:00"));
    }
    #[test]
    fn explicit_bounds_are_kept() {
        let now = at("2024-03-10 12:00:00");
        let ttl = Duration::from_secs(180);
        let (start, end) =
            resolve_window(Some("2024-03-09 06:00:00"), Some("2024-03-09"), now, ttl).unwrap();
        assert_eq!(start, at("2024-03-09 06:00:00"));
        assert!(end > at("2024-03-09 23:59:59") && end < at("2024-03-10"));
        assert!(resolve_window(Some("2024-03-10"), Some("2024-03-09 10:00:00"), now, ttl).is_err());
    }
}
