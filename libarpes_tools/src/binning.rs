//! Turning Themis data into something with physical axes.
//!
//! Raw DLD data is a stream of single electron events which gets histogrammed over
//! (x, y, corrected time). Converted data is already a 3D cube, it only needs its angle and
//! energy axes rebuilt from the conversion bounds stored alongside it.
use ndarray::{Array1, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::constants::{DEFAULT_BINS, DEFAULT_SUBSAMPLE_SIZE};
use super::error::BinningError;

/// A single electron detected by the delay-line detector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventRecord {
    pub x: f64,
    pub y: f64,
    pub time: f64,
}

impl EventRecord {
    pub fn new(x: f64, y: f64, time: f64) -> Self {
        Self { x, y, time }
    }
}

/// Linear calibration of the raw DLD time field: `raw * factor - offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeCalibration {
    pub factor: f64,
    pub offset: f64,
}

impl TimeCalibration {
    pub fn correct(&self, raw_time: f64) -> f64 {
        raw_time * self.factor - self.offset
    }
}

/// Options for histogramming raw events.
///
/// Binning every event of a long acquisition can exhaust memory, so by default only a
/// random subsample of `subsample_size` events is binned. Set it to `None` to bin them all.
/// Giving a `seed` makes the subsample reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningOptions {
    pub bins: [usize; 3],
    pub subsample_size: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for BinningOptions {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            subsample_size: Some(DEFAULT_SUBSAMPLE_SIZE),
            seed: None,
        }
    }
}

/// Counts over (x, y, time) and the bin edges along each of those axes.
///
/// `edges[axis]` always has one more element than `counts` has along `axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramResult {
    pub counts: Array3<u64>,
    pub edges: [Array1<f64>; 3],
}

impl HistogramResult {
    pub fn total_counts(&self) -> u64 {
        self.counts.sum()
    }
}

/// Energy and angle range of converted data. The angle is in radians, as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionBounds {
    pub minimum_energy: f64,
    pub maximum_energy: f64,
    pub maximum_angle: f64,
}

/// Converted data with its angle (degrees) and kinetic energy (eV) axes
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedCube {
    pub data: Array3<f64>,
    pub x_axis: Array1<f64>,
    pub y_axis: Array1<f64>,
    pub energy_axis: Array1<f64>,
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// The last value is exactly `stop`; `n == 1` gives `[start]`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values = Array1::from_shape_fn(n, |i| i as f64 * step + start);
            values[n - 1] = stop;
            values
        }
    }
}

/// Pick which of `len` events to bin.
///
/// If there are no more than `size` events all of them are used. Otherwise `size` distinct
/// indices are drawn uniformly, returned in ascending order.
pub fn subsample(len: usize, size: Option<usize>, seed: Option<u64>) -> Vec<usize> {
    let size = match size {
        Some(s) if s < len => s,
        _ => return (0..len).collect(),
    };
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut indices = rand::seq::index::sample(&mut rng, len, size).into_vec();
    indices.sort_unstable();
    indices
}

/// Edges spanning the finite values along one axis
fn axis_edges(values: impl Iterator<Item = f64>, n_bins: usize) -> Array1<f64> {
    let (mut low, mut high) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if low > high {
        // No data
        low = 0.0;
        high = 1.0;
    } else if low == high {
        low -= 0.5;
        high += 0.5;
    }
    linspace(low, high, n_bins + 1)
}

/// Index of the bin containing `value`. The last bin includes its right edge.
fn bin_index(edges: &[f64], value: f64) -> usize {
    let above = edges.partition_point(|&edge| edge <= value);
    (above.max(1) - 1).min(edges.len() - 2)
}

/// Histogram points over three axes with `bins` bins each.
///
/// Each axis spans the minimum to maximum of the data (widened by 0.5 either way when all
/// values coincide). Points with a NaN or infinite coordinate are left out.
pub fn histogram_3d(points: &[[f64; 3]], bins: [usize; 3]) -> Result<HistogramResult, BinningError> {
    if let Some(axis) = bins.iter().position(|&n| n == 0) {
        return Err(BinningError::ZeroBins(axis));
    }

    let finite: Vec<&[f64; 3]> = points
        .iter()
        .filter(|p| p.iter().all(|v| v.is_finite()))
        .collect();
    if finite.len() < points.len() {
        spdlog::warn!(
            "Dropped {} events with non-finite coordinates from the histogram",
            points.len() - finite.len()
        );
    }

    let edges = [0, 1, 2].map(|axis| axis_edges(finite.iter().map(|p| p[axis]), bins[axis]));

    let edge_lists = [0, 1, 2].map(|axis| edges[axis].to_vec());
    let mut counts = Array3::<u64>::zeros((bins[0], bins[1], bins[2]));
    for point in finite {
        let index = [0, 1, 2].map(|axis| bin_index(&edge_lists[axis], point[axis]));
        counts[index] += 1;
    }

    Ok(HistogramResult { counts, edges })
}

/// Histogram raw DLD events over (x, y, calibrated time).
pub fn bin_events(
    events: &[EventRecord],
    calibration: &TimeCalibration,
    options: &BinningOptions,
) -> Result<HistogramResult, BinningError> {
    if options.subsample_size == Some(0) {
        return Err(BinningError::ZeroSubsample);
    }
    let selection = subsample(events.len(), options.subsample_size, options.seed);
    if selection.len() < events.len() {
        spdlog::info!(
            "Binning a random subsample of {} out of {} events",
            selection.len(),
            events.len()
        );
    }

    let points: Vec<[f64; 3]> = selection
        .into_iter()
        .map(|idx| {
            let event = &events[idx];
            [event.x, event.y, calibration.correct(event.time)]
        })
        .collect();

    histogram_3d(&points, options.bins)
}

/// Rebuild the angle and energy axes of converted data.
///
/// The cube is returned untouched; axis lengths follow its shape.
pub fn reconstruct_axes(data: Array3<f64>, bounds: &ConversionBounds) -> ConvertedCube {
    let max_angle = bounds.maximum_angle / PI * 180.0;
    let (n_x, n_y, n_energy) = data.dim();
    ConvertedCube {
        x_axis: linspace(-max_angle, max_angle, n_x),
        y_axis: linspace(-max_angle, max_angle, n_y),
        energy_axis: linspace(bounds.minimum_energy, bounds.maximum_energy, n_energy),
        data,
    }
}
