//! Two-pass split-window spectral whitening
//!
//! Flattens the noise floor of a spectrum so harmonic peaks stand out.
//! First pass: estimate a local mean per bin through a split window (a
//! wide summation window with a narrow gap excised around the center) and
//! replace values far above that mean with it. Second pass: smooth the
//! peak-free spectrum with the same wide window, no gap, and subtract the
//! result from the original bins.

/// Bins summed on each side of center by the wide window (65 bins total).
const FILTER_HALF_WIDTH: usize = 32;
/// Bins excised on each side of center (5-bin gap). A Hamming window
/// smears the main FFT peak over about 5 bins.
const GAP_HALF_WIDTH: usize = 2;
/// First-pass cutoff: bins above this multiple of the local mean are
/// replaced by the mean.
const NOISE_THRESHOLD: f32 = 2.0;
/// Minimum whitened value for `pick_peaks` to accept a local maximum.
const SIGNAL_THRESHOLD: f32 = 30.0;

/// Reusable whitening state for spectra of a fixed bin count.
pub struct Whitener {
    bin_count: usize,
    no_peaks: Vec<f32>,
    sum: Vec<f32>,
    sum_count: Vec<i32>,
    sum_gap: Vec<f32>,
    sum_gap_count: Vec<i32>,
}

impl Whitener {
    /// `bin_count` must exceed the full filter width (65 bins).
    pub fn new(bin_count: usize) -> Self {
        Self {
            bin_count,
            no_peaks: vec![0.0; bin_count],
            sum: vec![0.0; bin_count],
            sum_count: vec![0; bin_count],
            sum_gap: vec![0.0; bin_count],
            sum_gap_count: vec![0; bin_count],
        }
    }

    /// Sliding-window summation: `sum[k]` covers `input[k-m]..=input[k+m]`,
    /// with out-of-range points treated as absent. `counts[k]` records how
    /// many elements actually contributed, so the caller can form a mean
    /// that stays honest near the edges.
    fn local_sum(input: &[f32], m: usize, sums: &mut [f32], counts: &mut [i32]) {
        let bin_count = input.len();

        sums[0] = input[..=m].iter().sum();
        counts[0] = m as i32 + 1;

        // Grow the window on the right until it is full.
        for i in 1..=m {
            sums[i] = sums[i - 1] + input[i + m];
            counts[i] = counts[i - 1] + 1;
        }

        // Slide the full window: drop the oldest, add the newest.
        for i in (m + 1)..(bin_count - m) {
            sums[i] = sums[i - 1] - input[i - 1 - m] + input[i + m];
            counts[i] = counts[i - 1];
        }

        // Shrink on the left as the window runs off the end.
        for i in (bin_count - m)..bin_count {
            sums[i] = sums[i - 1] - input[i - 1 - m];
            counts[i] = counts[i - 1] - 1;
        }
    }

    /// Whiten `input` into `output`, writing the second-pass noise mean
    /// estimate into `mean_out`. All three slices are `bin_count` long.
    /// Negative results clamp to zero.
    pub fn whiten(&mut self, input: &[f32], mean_out: &mut [f32], output: &mut [f32]) {
        // Split-window first pass: wide sum minus the gap contribution.
        Self::local_sum(input, FILTER_HALF_WIDTH, &mut self.sum, &mut self.sum_count);
        Self::local_sum(input, GAP_HALF_WIDTH, &mut self.sum_gap, &mut self.sum_gap_count);

        for i in 0..self.bin_count {
            let mean = (self.sum[i] - self.sum_gap[i])
                / (self.sum_count[i] - self.sum_gap_count[i]) as f32;
            self.no_peaks[i] = if input[i] > NOISE_THRESHOLD * mean {
                mean
            } else {
                input[i]
            };
        }

        // Second pass: conventional moving sum over the peak-free spectrum.
        Self::local_sum(
            &self.no_peaks,
            FILTER_HALF_WIDTH,
            &mut self.sum,
            &mut self.sum_count,
        );

        for i in 0..self.bin_count {
            let mean = self.sum[i] / self.sum_count[i] as f32;
            mean_out[i] = mean;
            output[i] = (input[i] - mean).max(0.0);
        }
    }

    /// Mark local maxima of a whitened spectrum: bins that exceed the
    /// signal threshold and their three neighbors on both sides get 50.0,
    /// the rest get 0.1. The first and last three bins are left untouched.
    pub fn pick_peaks(&self, input: &[f32], output: &mut [f32]) {
        for bin in 3..input.len() - 3 {
            let value = input[bin];
            let is_peak = value > SIGNAL_THRESHOLD
                && value > input[bin - 3]
                && value > input[bin - 2]
                && value > input[bin - 1]
                && value > input[bin + 1]
                && value > input[bin + 2]
                && value > input[bin + 3];
            output[bin] = if is_peak { 50.0 } else { 0.1 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIN_COUNT: usize = 256;

    #[test]
    fn test_local_sum_counts_shrink_at_edges() {
        let input = vec![1.0f32; BIN_COUNT];
        let mut sums = vec![0.0; BIN_COUNT];
        let mut counts = vec![0; BIN_COUNT];
        Whitener::local_sum(&input, 32, &mut sums, &mut counts);

        assert_eq!(counts[0], 33);
        assert_eq!(counts[32], 65);
        assert_eq!(counts[128], 65);
        assert_eq!(counts[BIN_COUNT - 1], 33);
        // With all-ones input each sum equals its count.
        for (sum, count) in sums.iter().zip(&counts) {
            assert!((sum - *count as f32).abs() < 1e-4);
        }
    }

    #[test]
    fn test_constant_spectrum_whitens_to_zero() {
        let mut whitener = Whitener::new(BIN_COUNT);
        let input = vec![7.5f32; BIN_COUNT];
        let mut mean = vec![0.0; BIN_COUNT];
        let mut output = vec![0.0; BIN_COUNT];
        whitener.whiten(&input, &mut mean, &mut output);

        // A flat spectrum is pure noise floor: the mean estimate matches
        // the input everywhere and the whitened output is zero.
        for i in 0..BIN_COUNT {
            assert!((mean[i] - 7.5).abs() < 1e-3, "mean[{i}] = {}", mean[i]);
            assert!(output[i].abs() < 1e-3, "output[{i}] = {}", output[i]);
        }
    }

    #[test]
    fn test_isolated_spike_survives_whitening() {
        let mut whitener = Whitener::new(BIN_COUNT);
        let mut input = vec![1.0f32; BIN_COUNT];
        input[100] = 500.0;
        let mut mean = vec![0.0; BIN_COUNT];
        let mut output = vec![0.0; BIN_COUNT];
        whitener.whiten(&input, &mut mean, &mut output);

        // The spike is replaced by the local mean in the first pass, so
        // the noise estimate stays near the floor and the spike remains
        // prominent after subtraction.
        assert!(output[100] > 400.0, "output[100] = {}", output[100]);
        assert!(output[20] < 1.0);
        assert!(output[200] < 1.0);
    }

    #[test]
    fn test_pick_peaks_marks_isolated_maximum() {
        let whitener = Whitener::new(BIN_COUNT);
        let mut input = vec![0.0f32; BIN_COUNT];
        input[100] = 45.0;
        let mut output = vec![-1.0f32; BIN_COUNT];
        whitener.pick_peaks(&input, &mut output);

        assert_eq!(output[100], 50.0);
        assert_eq!(output[50], 0.1);
        assert_eq!(output[103], 0.1);
        // Edge bins are never written.
        assert_eq!(output[0], -1.0);
        assert_eq!(output[2], -1.0);
        assert_eq!(output[BIN_COUNT - 3], -1.0);
        assert_eq!(output[BIN_COUNT - 1], -1.0);
    }

    #[test]
    fn test_pick_peaks_ignores_sub_threshold_maximum() {
        let whitener = Whitener::new(BIN_COUNT);
        let mut input = vec![0.0f32; BIN_COUNT];
        input[100] = 25.0; // local maximum but below the signal threshold
        let mut output = vec![0.0f32; BIN_COUNT];
        whitener.pick_peaks(&input, &mut output);
        assert_eq!(output[100], 0.1);
    }
}
