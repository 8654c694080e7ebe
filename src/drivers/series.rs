use chrono::NaiveDateTime;
use serde::Serialize;
/// One timestamped reading of a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplePoint {
    pub time: NaiveDateTime,
    pub value: f64,
}
impl SamplePoint {
    pub fn new(time: NaiveDateTime, value: f64) -> Self {
        Self { time, value }
    }
}
/// Ordered readings of one channel as delivered by the data source.
///
/// Order is not enforced on construction; consumers that need ascending time
/// call [`SampledSeries::sorted`] or check [`SampledSeries::is_ascending`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SampledSeries {
    pub points: Vec<SamplePoint>,
}
impl SampledSeries {
    pub fn new(points: Vec<SamplePoint>) -> Self {
        Self { points }
    }
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDateTime, f64)>) -> Self {
        Self {
            points: pairs
                .into_iter()
                .map(|(time, value)| SamplePoint::new(time, value))
                .collect(),
        }
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
    pub fn first(&self) -> Option<&SamplePoint> {
        self.points.first()
    }
    pub fn last(&self) -> Option<&SamplePoint> {
        self.points.last()
    }
    pub fn is_ascending(&self) -> bool {
        self.points.windows(2).all(|w| w[0].time <= w[1].time)
    }
    /// Copy of the series in ascending time order. Equal timestamps keep their
    /// delivered order.
    pub fn sorted(&self) -> SampledSeries {
        let mut points = self.points.clone();
        points.sort_by_key(|p| p.time);
        SampledSeries { points }
    }
    /// Seconds between consecutive readings; the undefined leading delta is dropped.
    pub fn intervals_secs(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| duration_secs(w[1].time - w[0].time))
            .collect()
    }
    /// Mean spacing of the readings, `None` below two points.
    pub fn mean_interval_secs(&self) -> Option<f64> {
        let intervals = self.intervals_secs();
        if intervals.is_empty() {
            return None;
        }
        Some(intervals.iter().sum::<f64>() / intervals.len() as f64)
    }
    /// Seconds elapsed since the first reading, one entry per point.
    pub fn elapsed_secs(&self) -> Vec<f64> {
        let Some(origin) = self.first().map(|p| p.time) else {
            return Vec::new();
        };
        self.points
            .iter()
            .map(|p| duration_secs(p.time - origin))
            .collect()
    }
}
pub(crate) fn duration_secs(delta: chrono::Duration) -> f64 {
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ScatterPoint3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
impl ScatterPoint3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}
/// Unordered (x, y, z) samples feeding a surface.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScatterSet3D {
    pub points: Vec<ScatterPoint3D>,
}
impl ScatterSet3D {
    pub fn new(points: Vec<ScatterPoint3D>) -> Self {
        Self { points }
    }
    /// Zips three equally long columns; extra values in longer columns are ignored.
    pub fn from_columns(xs: &[f64], ys: &[f64], zs: &[f64]) -> Self {
        let points = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| ScatterPoint3D::new(x, y, z))
            .collect();
        Self { points }
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &ScatterPoint3D> {
        self.points.iter()
    }
    pub fn distinct_x(&self) -> usize {
        distinct_count(self.points.iter().map(|p| p.x))
    }
    pub fn distinct_y(&self) -> usize {
        distinct_count(self.points.iter().map(|p| p.y))
    }
}
impl FromIterator<ScatterPoint3D> for ScatterSet3D {
    fn from_iter<I: IntoIterator<Item = ScatterPoint3D>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
fn distinct_count(values: impl Iterator<Item = f64>) -> usize {
    let mut values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| a == b);
    values.len()
}
