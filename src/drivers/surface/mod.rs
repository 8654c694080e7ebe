// src/drivers/surface/mod.rs
mod clough_tocher;
mod delaunay;
use std::collections::HashMap;
use log::{debug, warn};
use ndarray::{Array1, Array2};
use serde::Serialize;
use thiserror::Error;
use crate::drivers::{ScatterPoint3D, ScatterSet3D};
use clough_tocher::CloughTocher;
pub const DEFAULT_GRID_SIZE: usize = 100;
/// Minimum number of readings for a cubic surface.
pub const MIN_SURFACE_POINTS: usize = 4;
/// Failures inside the interpolation solver. Never leaves this module as an
/// error; [`SurfaceInterpolator::interpolate`] folds it into
/// [`SurfaceResult::Degenerate`].
#[derive(Debug, Error, PartialEq)]
pub(crate) enum InterpolationError {
    #[error("need at least three distinct sites, got {0}")]
    TooFewSites(usize),
    #[error("all sites are collinear")]
    Collinear,
    #[error("singular gradient system at site {0}")]
    SingularGradient(usize),
}
/// Why no surface was produced. Callers treat every reason the same way; the
/// reason is kept for logs and summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DegenerateReason {
    InsufficientPoints,
    InterpolationFailed,
    /// Fewer than two nodes per side were requested.
    GridTooSmall,
}
/// Regular grid surface; `zi[[row, col]]` is the value at `(xi[col], yi[row])`,
/// `None` where the node lies outside the data's convex hull.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceGrid {
    pub xi: Array1<f64>,
    pub yi: Array1<f64>,
    pub zi: Array2<Option<f64>>,
}
impl SurfaceGrid {
    pub fn grid_size(&self) -> usize {
        self.xi.len()
    }
    pub fn defined_cells(&self) -> usize {
        self.zi.iter().filter(|z| z.is_some()).count()
    }
    /// Smallest and largest defined value.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        self.zi.iter().flatten().fold(None, |acc, &z| match acc {
            None => Some((z, z)),
            Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
        })
    }
}
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceResult {
    Grid(SurfaceGrid),
    Degenerate(DegenerateReason),
}
impl SurfaceResult {
    pub fn grid(&self) -> Option<&SurfaceGrid> {
        match self {
            SurfaceResult::Grid(grid) => Some(grid),
            SurfaceResult::Degenerate(_) => None,
        }
    }
    pub fn is_degenerate(&self) -> bool {
        matches!(self, SurfaceResult::Degenerate(_))
    }
}
/// Resamples scattered (x, y, z) readings onto a `grid_size × grid_size`
/// grid spanning their x and y ranges, using Clough–Tocher cubic
/// interpolation over a Delaunay triangulation.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceInterpolator {
    grid_size: usize,
}
impl Default for SurfaceInterpolator {
    fn default() -> Self {
        Self::with_grid_size(DEFAULT_GRID_SIZE)
    }
}
impl SurfaceInterpolator {
    /// Sizes below 2 cannot span a range; [`interpolate`](Self::interpolate)
    /// answers them with [`DegenerateReason::GridTooSmall`].
    pub fn with_grid_size(grid_size: usize) -> Self {
        Self { grid_size }
    }
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }
    pub fn interpolate(&self, points: &ScatterSet3D) -> SurfaceResult {
        if self.grid_size < 2 {
            debug!("surface: grid size {} is below 2", self.grid_size);
            return SurfaceResult::Degenerate(DegenerateReason::GridTooSmall);
        }
        let finite: ScatterSet3D = points.iter().copied().filter(|p| p.is_finite()).collect();
        if finite.len() < points.len() {
            debug!(
                "surface: dropped {} non-finite reading(s)",
                points.len() - finite.len()
            );
        }
        if finite.len() < MIN_SURFACE_POINTS || finite.distinct_x() < 2 || finite.distinct_y() < 2
        {
            debug!(
                "surface: insufficient data ({} readings, {} distinct x, {} distinct y)",
                finite.len(),
                finite.distinct_x(),
                finite.distinct_y()
            );
            return SurfaceResult::Degenerate(DegenerateReason::InsufficientPoints);
        }
        let (sites, values) = merge_duplicate_sites(&finite.points);
        let interpolant = match CloughTocher::new(&sites, &values) {
            Ok(interpolant) => interpolant,
            Err(err) => {
                warn!("surface interpolation failed: {err}");
                return SurfaceResult::Degenerate(DegenerateReason::InterpolationFailed);
            }
        };
        let (x_min, x_max) = bounds(finite.iter().map(|p| p.x));
        let (y_min, y_max) = bounds(finite.iter().map(|p| p.y));
        let xi = Array1::linspace(x_min, x_max, self.grid_size);
        let yi = Array1::linspace(y_min, y_max, self.grid_size);
        let mut zi = Array2::from_elem((self.grid_size, self.grid_size), None);
        let mut hint = 0;
        for ((row, col), cell) in zi.indexed_iter_mut() {
            *cell = interpolant.evaluate([xi[col], yi[row]], &mut hint);
        }
        SurfaceResult::Grid(SurfaceGrid { xi, yi, zi })
    }
}
/// Collapses readings sharing an (x, y) site into one site carrying their mean z.
fn merge_duplicate_sites(points: &[ScatterPoint3D]) -> (Vec<[f64; 2]>, Vec<f64>) {
    let mut index: HashMap<(u64, u64), usize> = HashMap::with_capacity(points.len());
    let mut sites = Vec::with_capacity(points.len());
    let mut sums: Vec<(f64, usize)> = Vec::with_capacity(points.len());
    for p in points {
        let key = (site_bits(p.x), site_bits(p.y));
        let slot = *index.entry(key).or_insert_with(|| {
            sites.push([p.x, p.y]);
            sums.push((0.0, 0));
            sites.len() - 1
        });
        sums[slot].0 += p.z;
        sums[slot].1 += 1;
    }
    let values = sums.iter().map(|(sum, n)| sum / *n as f64).collect();
    (sites, values)
}
fn site_bits(v: f64) -> u64 {
    // -0.0 and 0.0 are the same site
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
