/// Width of one printed histogram row.
pub const ROW_WIDTH: usize = 20;

/// Pixel value histogram clipped at an upper limit.
///
/// Values above the limit are counted in the limit's bucket. The running sum
/// and the mode are kept on clipped values; min and max are raw.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    upper_limit: u16,
    buckets: Vec<u64>,
    total_count: u64,
    total_value: u64,
    min_raw: Option<u16>,
    max_raw: Option<u16>,
    max_clipped: u16,
    mode_value: u16,
    mode_count: u64,
}

impl HistogramAccumulator {
    pub fn new(upper_limit: u16) -> Self {
        Self {
            upper_limit,
            buckets: vec![0; upper_limit as usize + 1],
            total_count: 0,
            total_value: 0,
            min_raw: None,
            max_raw: None,
            max_clipped: 0,
            mode_value: 0,
            mode_count: 0,
        }
    }

    pub fn observe(&mut self, value: u16) {
        self.min_raw = Some(self.min_raw.map_or(value, |m| m.min(value)));
        self.max_raw = Some(self.max_raw.map_or(value, |m| m.max(value)));

        let clipped = value.min(self.upper_limit);
        self.max_clipped = self.max_clipped.max(clipped);

        let bucket = &mut self.buckets[clipped as usize];
        *bucket += 1;
        self.total_count += 1;
        self.total_value += clipped as u64;

        // strictly greater: the first value to reach a count keeps the mode
        if *bucket > self.mode_count {
            self.mode_count = *bucket;
            self.mode_value = clipped;
        }
    }

    pub fn observe_all(&mut self, values: impl IntoIterator<Item = u16>) {
        for value in values {
            self.observe(value);
        }
    }

    pub fn upper_limit(&self) -> u16 {
        self.upper_limit
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_value(&self) -> u64 {
        self.total_value
    }

    pub fn count(&self, value: u16) -> u64 {
        self.buckets.get(value as usize).copied().unwrap_or(0)
    }

    pub fn min(&self) -> Option<u16> {
        self.min_raw
    }

    pub fn max(&self) -> Option<u16> {
        self.max_raw
    }

    /// Most frequent clipped value and its count.
    pub fn mode(&self) -> Option<(u16, u64)> {
        (self.total_count > 0).then_some((self.mode_value, self.mode_count))
    }

    pub fn mean(&self) -> Option<f64> {
        (self.total_count > 0).then(|| self.total_value as f64 / self.total_count as f64)
    }

    /// Median by scanning buckets upwards from `remaining = total / 2`.
    ///
    /// After subtracting a bucket's count, the median is that value if
    /// `remaining <= 0`, or that value plus one half if `0 < remaining < 1`.
    /// Values 0..=19 seen once each give 9; values 0, 1, 2 give 0.5.
    pub fn median(&self) -> Option<f64> {
        if self.total_count == 0 {
            return None;
        }
        let mut remaining = self.total_count as f64 / 2.0;
        for (value, &count) in self.buckets.iter().enumerate() {
            remaining -= count as f64;
            if remaining <= 0.0 {
                return Some(value as f64);
            } else if remaining < 1.0 {
                return Some(value as f64 + 0.5);
            }
        }
        None
    }

    /// Buckets from 0 up to the row holding the largest clipped value seen,
    /// in runs of `ROW_WIDTH`. Each item is the first value of the run and its counts.
    pub fn rows(&self) -> impl Iterator<Item = (usize, Vec<u64>)> + '_ {
        let rows = if self.total_count == 0 {
            0
        } else {
            self.max_clipped as usize / ROW_WIDTH + 1
        };
        (0..rows).map(move |row| {
            let start = row * ROW_WIDTH;
            let counts = (start..start + ROW_WIDTH)
                .map(|v| self.buckets.get(v).copied().unwrap_or(0))
                .collect();
            (start, counts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pixel_counted_once() {
        let mut hist = HistogramAccumulator::new(100);
        let values = [0u16, 5, 5, 99, 100, 101, 65535, 42];
        hist.observe_all(values);

        let bucket_sum: u64 = (0..=100).map(|v| hist.count(v)).sum();
        assert_eq!(bucket_sum, values.len() as u64);
        assert_eq!(hist.total_count(), values.len() as u64);
        assert_eq!(hist.count(100), 3);
    }

    #[test]
    fn test_clipping_affects_sum_not_min_max() {
        let mut hist = HistogramAccumulator::new(10);
        hist.observe_all([3u16, 50, 7]);

        assert_eq!(hist.total_value(), 3 + 10 + 7);
        assert_eq!(hist.min(), Some(3));
        assert_eq!(hist.max(), Some(50));
        assert!((hist.mean().unwrap() - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_of_twenty_values() {
        let mut hist = HistogramAccumulator::new(10_000);
        hist.observe_all(0u16..20);
        assert_eq!(hist.median(), Some(9.0));
    }

    #[test]
    fn test_median_half_step_on_odd_count() {
        let mut hist = HistogramAccumulator::new(10_000);
        hist.observe_all([0u16, 1, 2]);
        assert_eq!(hist.median(), Some(0.5));
    }

    #[test]
    fn test_median_with_repeated_values() {
        let mut hist = HistogramAccumulator::new(10_000);
        hist.observe_all([4u16, 4, 4, 9]);
        assert_eq!(hist.median(), Some(4.0));
    }

    #[test]
    fn test_mode_first_seen_wins() {
        let mut hist = HistogramAccumulator::new(1000);
        hist.observe_all([7u16, 3, 3, 7, 1]);
        assert_eq!(hist.mode(), Some((3, 2)));

        hist.observe(7);
        assert_eq!(hist.mode(), Some((7, 3)));
    }

    #[test]
    fn test_mode_uses_clipped_bucket() {
        let mut hist = HistogramAccumulator::new(10);
        hist.observe_all([11u16, 12, 5]);
        assert_eq!(hist.mode(), Some((10, 2)));
    }

    #[test]
    fn test_empty_accumulator() {
        let hist = HistogramAccumulator::new(10_000);
        assert_eq!(hist.median(), None);
        assert_eq!(hist.mean(), None);
        assert_eq!(hist.mode(), None);
        assert_eq!(hist.min(), None);
        assert_eq!(hist.rows().count(), 0);
    }

    #[test]
    fn test_rows_cover_largest_clipped_value() {
        let mut hist = HistogramAccumulator::new(45);
        hist.observe_all([0u16, 19, 20, 60]);

        let rows: Vec<_> = hist.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, 0);
        assert_eq!(rows[0].1[19], 1);
        assert_eq!(rows[1].1[0], 1);
        assert_eq!(rows[2].0, 40);
        assert_eq!(rows[2].1[5], 1);
        assert_eq!(rows[2].1[6], 0);
        assert!(rows.iter().all(|(_, counts)| counts.len() == ROW_WIDTH));
    }
}
