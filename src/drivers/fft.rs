use std::borrow::Cow;
use log::debug;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;
use crate::drivers::SampledSeries;
/// One-sided amplitude spectrum of a single channel, ascending by frequency.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SpectrumResult {
    pub frequencies_hz: Vec<f64>,
    pub amplitudes: Vec<f64>,
}
impl SpectrumResult {
    pub fn empty() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies_hz
            .iter()
            .copied()
            .zip(self.amplitudes.iter().copied())
    }
    /// Spacing between neighbouring bins (`fs / N`).
    pub fn bin_width_hz(&self) -> Option<f64> {
        match self.frequencies_hz.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }
    /// Bin with the largest amplitude; the first one wins on ties.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.bins().fold(None, |best, bin| match best {
            Some((_, amp)) if amp >= bin.1 => best,
            _ => Some(bin),
        })
    }
}
/// Turns readings with irregular timestamps into a one-sided amplitude
/// spectrum, inferring the sampling rate from the mean reading interval.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpectrumEstimator;
impl SpectrumEstimator {
    pub fn new() -> Self {
        Self
    }
    /// Never fails: empty input, fewer than two readings, a zero or
    /// non-finite mean interval and non-finite values all give an empty result.
    pub fn estimate(&self, series: &SampledSeries) -> SpectrumResult {
        if series.is_empty() {
            return SpectrumResult::empty();
        }
        let ordered: Cow<'_, SampledSeries> = if series.is_ascending() {
            Cow::Borrowed(series)
        } else {
            Cow::Owned(series.sorted())
        };
        let Some(mean_interval) = ordered.mean_interval_secs() else {
            debug!("spectrum skipped: {} reading(s), need two", ordered.len());
            return SpectrumResult::empty();
        };
        if !mean_interval.is_finite() || mean_interval <= 0.0 {
            debug!("spectrum skipped: mean interval {mean_interval}s");
            return SpectrumResult::empty();
        }
        let values = ordered.values();
        if values.iter().any(|v| !v.is_finite()) {
            debug!("spectrum skipped: series contains non-finite values");
            return SpectrumResult::empty();
        }
        one_sided_spectrum(&values, 1.0 / mean_interval)
    }
}
/// Amplitude spectrum of uniformly sampled values, keeping bins `0..=N/2`.
///
/// Amplitudes are `|X_k| * 2 / N` for every kept bin, the DC bin included, so
/// a constant signal reports twice its level at 0 Hz.
pub fn one_sided_spectrum(values: &[f64], sampling_rate_hz: f64) -> SpectrumResult {
    let n = values.len();
    if n == 0 || !sampling_rate_hz.is_finite() || sampling_rate_hz <= 0.0 {
        return SpectrumResult::empty();
    }
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex64> = values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    fft.process(&mut buffer);
    let retained = n / 2 + 1;
    let bin_width = sampling_rate_hz / n as f64;
    let scale = 2.0 / n as f64;
    let frequencies_hz = (0..retained).map(|k| k as f64 * bin_width).collect();
    let amplitudes = buffer
        .iter()
        .take(retained)
        .map(|c| c.norm() * scale)
        .collect();
    SpectrumResult {
        frequencies_hz,
        amplitudes,
    }
}
