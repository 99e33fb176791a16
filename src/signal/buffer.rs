use std::collections::VecDeque;
use ndarray::Array2;
use crate::signal::Spectrum;
/// Entries in the trend history.
pub const TREND_LEN: usize = 40;
/// Columns kept in the spectrogram history.
pub const SPECTROGRAM_COLUMNS: usize = 80;
/// Rows per spectrogram column.
pub const SPECTROGRAM_ROWS: usize = 40;
/// Fixed-length FIFO of normalized readings. Always holds exactly `capacity` entries.
#[derive(Clone, Debug)]
pub struct TrendBuffer {
    values: VecDeque<f32>,
    capacity: usize,
}
impl TrendBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: std::iter::repeat(0.0).take(capacity).collect(),
            capacity,
        }
    }
    /// Appends `value`, evicting the oldest entry.
    pub fn push(&mut self, value: f32) {
        if self.capacity == 0 {
            return;
        }
        self.values.pop_front();
        self.values.push_back(value);
    }
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }
    #[cfg(test)]
    pub fn latest(&self) -> Option<f32> {
        self.values.back().copied()
    }
    /// Oldest first.
    pub fn to_vec(&self) -> Vec<f32> {
        self.values.iter().copied().collect()
    }
}
impl Default for TrendBuffer {
    fn default() -> Self {
        Self::new(TREND_LEN)
    }
}
/// Rolling history of downsampled spectra, one column per tick.
///
/// Never reset: the history spans channel switches.
#[derive(Clone, Debug)]
pub struct SpectrogramBuffer {
    columns: VecDeque<Vec<f32>>,
    capacity: usize,
    rows: usize,
}
impl SpectrogramBuffer {
    pub fn new(capacity: usize, rows: usize) -> Self {
        Self {
            columns: VecDeque::with_capacity(capacity + 1),
            capacity,
            rows,
        }
    }
    /// Downsamples `spectrum` to `rows` entries by nearest index, appends it and returns
    /// the new column. Row `r` reads bin `floor(r / rows * bins)`.
    pub fn push_column(&mut self, spectrum: &Spectrum) -> Vec<f32> {
        let bins = spectrum.magnitudes.len();
        let column: Vec<f32> = (0..self.rows)
            .map(|r| {
                let bin = r * bins / self.rows;
                spectrum.magnitudes.get(bin).copied().unwrap_or(0.0)
            })
            .collect();
        self.columns.push_back(column.clone());
        while self.columns.len() > self.capacity {
            self.columns.pop_front();
        }
        column
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    /// Oldest column first.
    pub fn to_columns(&self) -> Vec<Vec<f32>> {
        self.columns.iter().cloned().collect()
    }
}
impl Default for SpectrogramBuffer {
    fn default() -> Self {
        Self::new(SPECTROGRAM_COLUMNS, SPECTROGRAM_ROWS)
    }
}
/// Packs columns (oldest first) into a `rows x columns` grid for heat-map drawing.
pub fn columns_to_grid(columns: &[Vec<f32>], rows: usize) -> Array2<f32> {
    let mut grid = Array2::<f32>::zeros((rows, columns.len()));
    for (c, column) in columns.iter().enumerate() {
        for (r, value) in column.iter().take(rows).enumerate() {
            grid[[r, c]] = *value;
        }
    }
    grid
}
#[cfg(test)]
mod tests {
    use super::*;
    fn ramp_spectrum(offset: f32) -> Spectrum {
        Spectrum {
            magnitudes: (0..48).map(|i| (i as f32 / 100.0 + offset).min(1.0)).collect(),
        }
    }
    #[test]
    fn trend_starts_zeroed_at_full_length() {
        let trend = TrendBuffer::default();
        assert_eq!(trend.len(), TREND_LEN);
        assert!(trend.to_vec().iter().all(|v| *v == 0.0));
    }
    #[test]
    fn trend_push_evicts_exactly_the_oldest() {
        let mut trend = TrendBuffer::default();
        for i in 0..TREND_LEN {
            trend.push(i as f32);
        }
        trend.push(99.0);
        let values = trend.to_vec();
        assert_eq!(values.len(), TREND_LEN);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[TREND_LEN - 2], (TREND_LEN - 1) as f32);
        assert_eq!(trend.latest(), Some(99.0));
    }
    #[test]
    fn trend_reset_zeroes_without_shrinking() {
        let mut trend = TrendBuffer::default();
        trend.push(0.8);
        trend.reset();
        assert_eq!(trend.len(), TREND_LEN);
        assert_eq!(trend.latest(), Some(0.0));
    }
    #[test]
    fn column_downsamples_by_nearest_index() {
        let mut spectrogram = SpectrogramBuffer::default();
        let spectrum = ramp_spectrum(0.0);
        let column = spectrogram.push_column(&spectrum);
        assert_eq!(column.len(), SPECTROGRAM_ROWS);
        assert_eq!(column[0], spectrum.magnitudes[0]);
        // floor(1 / 40 * 48) = 1, floor(39 / 40 * 48) = 46
        assert_eq!(column[1], spectrum.magnitudes[1]);
        assert_eq!(column[5], spectrum.magnitudes[6]);
        assert_eq!(column[39], spectrum.magnitudes[46]);
    }
    #[test]
    fn spectrogram_keeps_last_columns_in_arrival_order() {
        let mut spectrogram = SpectrogramBuffer::default();
        let mut pushed = Vec::new();
        for i in 0..(SPECTROGRAM_COLUMNS + 5) {
            pushed.push(spectrogram.push_column(&ramp_spectrum(i as f32 / 1000.0)));
            assert!(spectrogram.len() <= SPECTROGRAM_COLUMNS);
        }
        assert_eq!(spectrogram.len(), SPECTROGRAM_COLUMNS);
        assert_eq!(spectrogram.to_columns(), pushed[5..].to_vec());
    }
    #[test]
    fn grid_is_rows_by_columns() {
        let columns = vec![vec![0.1; 4], vec![0.9; 4]];
        let grid = columns_to_grid(&columns, 4);
        assert_eq!(grid.dim(), (4, 2));
        assert_eq!(grid[[3, 1]], 0.9);
    }
}
