use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::error::DashboardError;
use crate::drivers::fft::SpectrumResult;
use crate::drivers::surface::SurfaceGrid;
use crate::drivers::SampledSeries;
use crate::types::SpectrumStyle;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub text: RGBColor,
    pub grid: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Draw captions, tick labels and axis descriptions. Needs a system font.
    pub annotate: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(0xf9, 0xf9, 0xf9),
            text: RGBColor(0x2c, 0x3e, 0x50),
            grid: RGBColor(0xbd, 0xc3, 0xc7),
            palette: vec![
                RGBColor(0x34, 0x98, 0xdb),
                RGBColor(0xe7, 0x4c, 0x3c),
                RGBColor(0x2e, 0xcc, 0x71),
                RGBColor(0x9b, 0x59, 0xb6),
            ],
            annotate: true,
        }
    }
}
impl PlotStyle {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }
    pub fn without_annotations(mut self) -> Self {
        self.annotate = false;
        self
    }
    fn primary(&self) -> RGBColor {
        self.palette.first().copied().unwrap_or(BLUE)
    }
}
/// Line with markers over seconds elapsed since the first sample.
pub fn render_time_series_png(
    series: &SampledSeries,
    title: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, DashboardError> {
    if series.is_empty() {
        return Err(DashboardError::Plot(format!("`{title}` has no samples")));
    }
    let mut buffer = vec![0u8; canvas_len(style.width, style.height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        draw_series(&root, series, title, style.primary(), style)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// One-sided amplitude spectrum as bars or a polyline.
pub fn render_spectrum_png(
    spectrum: &SpectrumResult,
    title: &str,
    kind: SpectrumStyle,
    style: &PlotStyle,
) -> Result<Vec<u8>, DashboardError> {
    if spectrum.is_empty() {
        return Err(DashboardError::Plot(format!("`{title}` spectrum is empty")));
    }
    let mut buffer = vec![0u8; canvas_len(style.width, style.height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let half_bin = spectrum.bin_width_hz().unwrap_or(1.0) / 2.0;
        let f_max = spectrum.frequencies_hz.last().copied().unwrap_or(0.0);
        let a_max = spectrum
            .amplitudes
            .iter()
            .copied()
            .fold(0.0f64, f64::max)
            .max(1e-3);
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.annotate {
            builder
                .caption(title, ("sans-serif", 20).into_font().color(&style.text))
                .set_label_area_size(LabelAreaPosition::Left, 55)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart =
            builder.build_cartesian_2d(-half_bin..f_max + half_bin, 0f64..a_max * 1.05)?;
        if style.annotate {
            chart
                .configure_mesh()
                .light_line_style(&style.grid.mix(0.3))
                .x_desc("Frequency (Hz)")
                .y_desc("Magnitude")
                .label_style(("sans-serif", 12).into_font().color(&style.text))
                .draw()?;
        }
        let color = style.primary();
        match kind {
            SpectrumStyle::Bars => {
                chart.draw_series(spectrum.bins().map(|(f, a)| {
                    Rectangle::new(
                        [(f - half_bin * 0.8, 0.0), (f + half_bin * 0.8, a)],
                        color.filled(),
                    )
                }))?;
            }
            SpectrumStyle::Lines => {
                chart.draw_series(LineSeries::new(spectrum.bins(), color.stroke_width(2)))?;
            }
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Top-down heatmap of a resampled surface; nodes outside the hull stay background.
pub fn render_surface_png(
    grid: &SurfaceGrid,
    title: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, DashboardError> {
    let Some((z_min, z_max)) = grid.z_range() else {
        return Err(DashboardError::Plot(format!("`{title}` surface has no values")));
    };
    let n = grid.grid_size();
    if n < 2 {
        return Err(DashboardError::Plot(format!("`{title}` grid is too small")));
    }
    let mut buffer = vec![0u8; canvas_len(style.width, style.height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let dx = (grid.xi[n - 1] - grid.xi[0]) / (n - 1) as f64;
        let dy = (grid.yi[n - 1] - grid.yi[0]) / (n - 1) as f64;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.annotate {
            builder
                .caption(title, ("sans-serif", 20).into_font().color(&style.text))
                .set_label_area_size(LabelAreaPosition::Left, 55)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(
            grid.xi[0] - dx / 2.0..grid.xi[n - 1] + dx / 2.0,
            grid.yi[0] - dy / 2.0..grid.yi[n - 1] + dy / 2.0,
        )?;
        if style.annotate {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("X")
                .y_desc("Y")
                .label_style(("sans-serif", 12).into_font().color(&style.text))
                .draw()?;
        }
        chart.draw_series(grid.zi.indexed_iter().filter_map(|((row, col), z)| {
            z.map(|z| {
                let (x, y) = (grid.xi[col], grid.yi[row]);
                Rectangle::new(
                    [(x - dx / 2.0, y - dy / 2.0), (x + dx / 2.0, y + dy / 2.0)],
                    viridis(normalize(z, z_min, z_max)).filled(),
                )
            })
        }))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Several series side by side, one subplot each.
pub fn render_combined_png(
    panels: &[(&str, &SampledSeries)],
    style: &PlotStyle,
) -> Result<Vec<u8>, DashboardError> {
    if panels.is_empty() || panels.iter().any(|(_, s)| s.is_empty()) {
        return Err(DashboardError::Plot("combined plot needs non-empty series".into()));
    }
    let mut buffer = vec![0u8; canvas_len(style.width, style.height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let areas = root.split_evenly((1, panels.len()));
        for (idx, (area, (title, series))) in areas.iter().zip(panels).enumerate() {
            let color = style
                .palette
                .get(idx % style.palette.len().max(1))
                .copied()
                .unwrap_or_else(|| style.primary());
            draw_series(area, series, title, color, style)?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn draw_series<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &SampledSeries,
    title: &str,
    color: RGBColor,
    style: &PlotStyle,
) -> Result<(), DashboardError>
where
    DB::ErrorType: 'static,
{
    let xs = series.elapsed_secs();
    let points: Vec<(f64, f64)> = xs.into_iter().zip(series.values()).collect();
    let (x_lo, x_hi) = padded(points.iter().map(|p| p.0));
    let (y_lo, y_hi) = padded(points.iter().map(|p| p.1));
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if style.annotate {
        builder
            .caption(title, ("sans-serif", 18).into_font().color(&style.text))
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40);
    }
    let mut chart = builder.build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;
    if style.annotate {
        chart
            .configure_mesh()
            .light_line_style(&style.grid.mix(0.3))
            .x_desc("Time (s)")
            .y_desc("Value")
            .label_style(("sans-serif", 12).into_font().color(&style.text))
            .draw()?;
    }
    chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
    )?;
    Ok(())
}
/// RGB byte count of a `width × height` canvas, computed without `u32` overflow.
fn canvas_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}
/// Finite bounds, widened when every value is the same.
fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (-1.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        let pad = lo.abs().max(1.0) * 0.05;
        return (lo - pad, hi + pad);
    }
    (lo, hi)
}
fn normalize(z: f64, lo: f64, hi: f64) -> f64 {
    if hi - lo < f64::EPSILON {
        0.5
    } else {
        ((z - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}
fn viridis(t: f64) -> RGBColor {
    const STOPS: [(u8, u8, u8); 5] = [
        (68, 1, 84),
        (59, 82, 139),
        (33, 145, 140),
        (94, 201, 98),
        (253, 231, 37),
    ];
    let scaled = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - idx as f64;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (STOPS[idx], STOPS[idx + 1]);
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DashboardError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| DashboardError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use ndarray::{Array1, Array2};
    use crate::drivers::fft::one_sided_spectrum;
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    fn style() -> PlotStyle {
        PlotStyle::default().with_size(320, 200).without_annotations()
    }
    fn series(n: i64) -> SampledSeries {
        let base = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        SampledSeries::from_pairs((0..n).map(|i| (base + Duration::seconds(i), (i as f64).sin())))
    }
    #[test]
    fn time_series_renders_png() {
        let png = render_time_series_png(&series(20), "XOUT", &style()).unwrap();
        assert_eq!(png[..8], PNG_MAGIC);
        let flat = render_time_series_png(&series(1), "XOUT", &style()).unwrap();
        assert!(!flat.is_empty());
    }
    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            render_time_series_png(&SampledSeries::default(), "XOUT", &style()),
            Err(DashboardError::Plot(_))
        ));
        assert!(matches!(
            render_spectrum_png(&SpectrumResult::empty(), "PEAK_FREQ_X", SpectrumStyle::Bars, &style()),
            Err(DashboardError::Plot(_))
        ));
        assert!(render_combined_png(&[], &style()).is_err());
    }
    #[test]
    fn spectrum_renders_as_bars_and_lines() {
        let spectrum = one_sided_spectrum(&[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0], 8.0);
        for kind in [SpectrumStyle::Bars, SpectrumStyle::Lines] {
            let png = render_spectrum_png(&spectrum, "PEAK_FREQ_X", kind, &style()).unwrap();
            assert_eq!(png[..8], PNG_MAGIC);
        }
    }
    #[test]
    fn surface_heatmap_leaves_gaps() {
        let mut zi = Array2::from_elem((4, 4), None);
        zi[[0, 0]] = Some(1.0);
        zi[[1, 2]] = Some(3.0);
        zi[[3, 3]] = Some(2.0);
        let grid = SurfaceGrid {
            xi: Array1::linspace(0.0, 3.0, 4),
            yi: Array1::linspace(-1.0, 1.0, 4),
            zi,
        };
        let png = render_surface_png(&grid, "3D Surface for XYZ Axis", &style()).unwrap();
        assert_eq!(png[..8], PNG_MAGIC);
        let empty = SurfaceGrid {
            xi: Array1::linspace(0.0, 1.0, 2),
            yi: Array1::linspace(0.0, 1.0, 2),
            zi: Array2::from_elem((2, 2), None),
        };
        assert!(render_surface_png(&empty, "empty", &style()).is_err());
    }
    #[test]
    fn combined_renders_one_panel_per_series() {
        let (a, b, c) = (series(10), series(12), series(5));
        let png = render_combined_png(&[("X", &a), ("Y", &b), ("Z", &c)], &style()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 200));
    }
    #[test]
    fn canvas_size_does_not_wrap() {
        assert_eq!(canvas_len(320, 200), 192_000);
        assert_eq!(canvas_len(40_000, 40_000), 4_800_000_000);
    }
    #[test]
    fn colormap_spans_dark_to_bright() {
        assert_eq!(viridis(0.0), RGBColor(68, 1, 84));
        assert_eq!(viridis(1.0), RGBColor(253, 231, 37));
        assert_eq!(normalize(5.0, 5.0, 5.0), 0.5);
    }
}
