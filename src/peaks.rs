//! Peak analysis and frame-signal helpers
//!
//! A single local-maximum search (with height, spacing and prominence
//! criteria) plus half-prominence width measurement. Both the segmentation
//! pass and the onset splitting pass go through these functions.

/// Selection criteria applied by [`find_peaks`], in this order:
/// height, distance, prominence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum peak value
    pub height: Option<f64>,
    /// Minimum spacing in frames between accepted peaks; 1 disables the check
    pub distance: usize,
    /// Minimum prominence
    pub prominence: Option<f64>,
}

impl Default for PeakCriteria {
    fn default() -> Self {
        Self {
            height: None,
            distance: 1,
            prominence: None,
        }
    }
}

/// Prominence of a peak and the bases it was measured against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prominence {
    pub prominence: f64,
    pub left_base: usize,
    pub right_base: usize,
}

/// Width of a peak at a relative prominence height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakWidth {
    pub width: f64,
    /// Signal level at which the width was measured
    pub width_height: f64,
    /// Interpolated position of the left crossing
    pub left_ip: f64,
    /// Interpolated position of the right crossing
    pub right_ip: f64,
}

/// Find all local maxima. Flat plateaus resolve to their middle sample
/// (rounded down); the first and last samples are never peaks.
pub fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                peaks.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// Drop peaks closer than `distance` to a higher peak, visiting the
/// highest peaks first.
fn select_by_distance(peaks: &[usize], priority: &[f64], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut keep = vec![true; n];

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| priority[a].total_cmp(&priority[b]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }

        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Compute prominences for the given peak positions.
///
/// Each side is scanned outward while the signal stays at or below the
/// peak; the lowest sample seen is that side's base. The prominence is the
/// peak height above the higher of the two bases.
pub fn peak_prominences(x: &[f64], peaks: &[usize]) -> Vec<Prominence> {
    peaks
        .iter()
        .map(|&peak| {
            let height = x[peak];

            let mut left_min = height;
            let mut left_base = peak;
            for i in (0..=peak).rev() {
                if x[i] > height {
                    break;
                }
                if x[i] < left_min {
                    left_min = x[i];
                    left_base = i;
                }
            }

            let mut right_min = height;
            let mut right_base = peak;
            for (i, &value) in x.iter().enumerate().skip(peak) {
                if value > height {
                    break;
                }
                if value < right_min {
                    right_min = value;
                    right_base = i;
                }
            }

            Prominence {
                prominence: height - left_min.max(right_min),
                left_base,
                right_base,
            }
        })
        .collect()
}

/// Measure peak widths at `rel_height` of each peak's prominence.
///
/// The crossing search on each side stops at that side's prominence base;
/// crossings between samples are linearly interpolated.
pub fn peak_widths(x: &[f64], peaks: &[usize], rel_height: f64) -> Vec<PeakWidth> {
    let prominences = peak_prominences(x, peaks);

    peaks
        .iter()
        .zip(prominences)
        .map(|(&peak, prom)| {
            let height = x[peak] - prom.prominence * rel_height;

            let mut i = peak;
            while prom.left_base < i && height < x[i] {
                i -= 1;
            }
            let mut left_ip = i as f64;
            if x[i] < height {
                left_ip += (height - x[i]) / (x[i + 1] - x[i]);
            }

            let mut i = peak;
            while i < prom.right_base && height < x[i] {
                i += 1;
            }
            let mut right_ip = i as f64;
            if x[i] < height {
                right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
            }

            PeakWidth {
                width: right_ip - left_ip,
                width_height: height,
                left_ip,
                right_ip,
            }
        })
        .collect()
}

/// Find peaks matching `criteria`, returned in increasing frame order.
pub fn find_peaks(x: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    let mut peaks = local_maxima(x);

    if let Some(min_height) = criteria.height {
        peaks.retain(|&p| x[p] >= min_height);
    }

    if criteria.distance > 1 && peaks.len() > 1 {
        let priority: Vec<f64> = peaks.iter().map(|&p| x[p]).collect();
        peaks = select_by_distance(&peaks, &priority, criteria.distance);
    }

    if let Some(min_prominence) = criteria.prominence {
        let prominences = peak_prominences(x, &peaks);
        peaks = peaks
            .into_iter()
            .zip(prominences)
            .filter(|(_, p)| p.prominence >= min_prominence)
            .map(|(peak, _)| peak)
            .collect();
    }

    peaks
}

/// Rescale to [0, 1] by min-max normalization. A constant signal maps to
/// all zeros.
pub fn min_max_normalize(x: &[f64]) -> Vec<f64> {
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !(range > 0.0) {
        return vec![0.0; x.len()];
    }

    x.iter()
        .map(|&v| ((v - min) / range).clamp(0.0, 1.0))
        .collect()
}

/// Central-difference gradient with one-sided differences at both ends.
pub fn gradient(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n)
            .map(|i| {
                if i == 0 {
                    x[1] - x[0]
                } else if i == n - 1 {
                    x[n - 1] - x[n - 2]
                } else {
                    (x[i + 1] - x[i - 1]) / 2.0
                }
            })
            .collect(),
    }
}

/// Median, averaging the two middle values for even lengths.
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Mean and population standard deviation.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (v - mean).powi(2))
        .sum::<f64>()
        / n;

    (mean, variance.sqrt())
}

/// Round half to even, then clamp into `[lo, hi]`.
pub fn round_clamped(value: f64, lo: usize, hi: usize) -> usize {
    let rounded = value.round_ties_even();
    if rounded <= lo as f64 {
        lo
    } else if rounded >= hi as f64 {
        hi
    } else {
        rounded as usize
    }
}
