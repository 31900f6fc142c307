use serde::Serialize;

/// Running mean and variance (Welford).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
    sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    /// Population (not sample) standard deviation.
    pub std_dev: f64,
    pub sum: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
            sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;
        self.sum += val;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn n_vals(&self) -> usize {
        self.n_vals
    }

    /// Mean of the values added so far, or `0.0` if there are none.
    pub fn mean_or_zero(&self) -> f64 {
        if self.n_vals == 0 { 0.0 } else { self.mean }
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 0 {
                (self.diff_2_sum / self.n_vals as f64).sqrt()
            } else {
                f64::NAN
            },
            sum: self.sum,
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<f64> for Accumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        iter.into_iter().for_each(|val| acc.add(val));
        acc
    }
}

/// Percentile `p` (in `[0, 100]`) with linear interpolation between order statistics.
///
/// `sorted` must be sorted in ascending order.
pub fn compute_percentile(sorted: &[f64], p: f64) -> f64 {
    let n_vals = sorted.len();
    if n_vals == 0 {
        return f64::NAN;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (n_vals - 1) as f64;
    let i_lo = rank.floor() as usize;
    let i_hi = rank.ceil() as usize;
    let frac = rank - i_lo as f64;
    sorted[i_lo] + frac * (sorted[i_hi] - sorted[i_lo])
}

pub fn compute_median(vals: &[f64]) -> f64 {
    compute_percentile(&sorted_copy(vals), 50.0)
}

pub fn sorted_copy(vals: &[f64]) -> Vec<f64> {
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accumulator_matches_direct_formulas() {
        let vals = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let report = vals.iter().copied().collect::<Accumulator>().report();
        assert_eq!(report.n_vals, 8);
        assert_relative_eq!(report.mean, 5.0);
        assert_relative_eq!(report.std_dev, 2.0);
        assert_relative_eq!(report.sum, 40.0);
    }

    #[test]
    fn empty_accumulator() {
        let acc = Accumulator::new();
        assert_eq!(acc.mean_or_zero(), 0.0);
        assert!(acc.report().mean.is_nan());
        assert_eq!(acc.report().sum, 0.0);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_relative_eq!(compute_percentile(&sorted, 0.0), 10.0);
        assert_relative_eq!(compute_percentile(&sorted, 25.0), 17.5);
        assert_relative_eq!(compute_percentile(&sorted, 50.0), 25.0);
        assert_relative_eq!(compute_percentile(&sorted, 75.0), 32.5);
        assert_relative_eq!(compute_percentile(&sorted, 100.0), 40.0);
        assert!(compute_percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn median_of_unsorted_values() {
        assert_relative_eq!(compute_median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(compute_median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
