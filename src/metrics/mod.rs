//! Streaming corpus statistics.
//!
//! A `MetricsAggregator` is fed one tile at a time and only keeps counts, so
//! memory does not grow with the corpus. Reports are rendered on demand.

pub mod frequency;
pub mod histogram;

pub use frequency::FrequencyTable;
pub use histogram::HistogramAccumulator;

use crate::tile::Tile;
use std::io::{self, Write};

pub const DEFAULT_UPPER_LIMITS: [u16; 2] = [10_000, 40_000];

#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    histograms: Vec<HistogramAccumulator>,
    bands: FrequencyTable,
    sizes: FrequencyTable,
    labels: FrequencyTable,
    single_labels: FrequencyTable,
    first_label_only: bool,
    tiles: u64,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(&DEFAULT_UPPER_LIMITS, false)
    }
}

impl MetricsAggregator {
    /// One histogram is kept per upper limit, all fed the same pixels.
    pub fn new(upper_limits: &[u16], first_label_only: bool) -> Self {
        Self {
            histograms: upper_limits
                .iter()
                .map(|&limit| HistogramAccumulator::new(limit))
                .collect(),
            bands: FrequencyTable::new(),
            sizes: FrequencyTable::new(),
            labels: FrequencyTable::new(),
            single_labels: FrequencyTable::new(),
            first_label_only,
            tiles: 0,
        }
    }

    pub fn observe_tile(&mut self, tile: &Tile) {
        for image in &tile.images {
            self.bands.increment(&image.band);
            self.sizes
                .increment(&format!("{} X {}", image.width, image.height));
            for hist in &mut self.histograms {
                hist.observe_all(image.pixel_values());
            }
        }

        let mut labels = tile.labels();
        if self.first_label_only && labels.len() > 1 {
            labels = &labels[..1];
        }
        for label in labels {
            self.labels.increment(label);
            if labels.len() == 1 {
                self.single_labels.increment(label);
            }
        }

        self.tiles += 1;
    }

    pub fn tiles(&self) -> u64 {
        self.tiles
    }

    pub fn histograms(&self) -> &[HistogramAccumulator] {
        &self.histograms
    }

    pub fn bands(&self) -> &FrequencyTable {
        &self.bands
    }

    pub fn sizes(&self) -> &FrequencyTable {
        &self.sizes
    }

    pub fn labels(&self) -> &FrequencyTable {
        &self.labels
    }

    pub fn single_labels(&self) -> &FrequencyTable {
        &self.single_labels
    }

    /// Write the full report, once per histogram upper limit.
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for hist in &self.histograms {
            writeln!(
                out,
                "=== metrics after {} tiles (upper limit {}) ===",
                self.tiles,
                hist.upper_limit()
            )?;
            self.write_histogram(out, hist)?;
            self.write_tables(out)?;
        }
        Ok(())
    }

    fn write_histogram<W: Write>(&self, out: &mut W, hist: &HistogramAccumulator) -> io::Result<()> {
        for (start, counts) in hist.rows() {
            writeln!(
                out,
                "values {}-{}: {:?}",
                start,
                start + histogram::ROW_WIDTH - 1,
                counts
            )?;
        }

        writeln!(out, "total pixel count: {}", hist.total_count())?;
        writeln!(out, "total pixel value: {}", hist.total_value())?;
        if hist.total_count() == 0 {
            return writeln!(out, "no pixels observed");
        }

        if let Some((value, count)) = hist.mode() {
            writeln!(out, "most common pixel value: {}", value)?;
            writeln!(out, "most common pixel count: {}", count)?;
        }
        if let Some(mean) = hist.mean() {
            writeln!(out, "mean pixel value: {:.6}", mean)?;
        }
        if let Some(median) = hist.median() {
            writeln!(out, "median pixel value: {:.6}", median)?;
        }
        if let (Some(min), Some(max)) = (hist.min(), hist.max()) {
            writeln!(out, "min pixel value: {}", min)?;
            writeln!(out, "max pixel value: {}", max)?;
        }
        Ok(())
    }

    fn write_tables<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (band, count) in self.bands.iter() {
            writeln!(out, "band {}: {}", band, count)?;
        }
        for (size, count) in self.sizes.iter() {
            writeln!(out, "size {}: {}", size, count)?;
        }
        for (label, count) in self.labels.ranked() {
            writeln!(out, "label {}: {}", label, count)?;
        }
        for (label, count) in self.single_labels.ranked() {
            writeln!(out, "label single {}: {}", label, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Image, Metadata};
    use ndarray::Array2;
    use std::path::PathBuf;

    fn labelled_tile(labels: &[&str]) -> Tile {
        let mut tile = Tile::directory("/corpus", "tile");
        tile.metadata = Some(Metadata {
            labels: labels.iter().map(|l| l.to_string()).collect(),
        });
        tile
    }

    fn image(band_file: &str, width: usize, height: usize, values: Vec<u16>) -> Image {
        let mut image = Image::new(PathBuf::from(band_file));
        image.width = width;
        image.height = height;
        image.pixels = Some(Array2::from_shape_vec((height, width), values).unwrap());
        image
    }

    #[test]
    fn test_two_labels_are_not_single() {
        let mut metrics = MetricsAggregator::default();
        metrics.observe_tile(&labelled_tile(&["A", "B"]));

        assert_eq!(metrics.labels().get("A"), 1);
        assert_eq!(metrics.labels().get("B"), 1);
        assert_eq!(metrics.single_labels().get("A"), 0);
        assert_eq!(metrics.single_labels().get("B"), 0);
    }

    #[test]
    fn test_single_label_counted_twice() {
        let mut metrics = MetricsAggregator::default();
        metrics.observe_tile(&labelled_tile(&["A"]));

        assert_eq!(metrics.labels().get("A"), 1);
        assert_eq!(metrics.single_labels().get("A"), 1);
    }

    #[test]
    fn test_first_label_only() {
        let mut metrics = MetricsAggregator::new(&DEFAULT_UPPER_LIMITS, true);
        metrics.observe_tile(&labelled_tile(&["A", "B"]));

        assert_eq!(metrics.labels().get("A"), 1);
        assert_eq!(metrics.labels().get("B"), 0);
        assert_eq!(metrics.single_labels().get("A"), 1);
    }

    #[test]
    fn test_tile_without_metadata() {
        let mut metrics = MetricsAggregator::default();
        metrics.observe_tile(&Tile::directory("/corpus", "bare"));

        assert!(metrics.labels().is_empty());
        assert_eq!(metrics.tiles(), 1);
    }

    #[test]
    fn test_images_feed_bands_sizes_and_histograms() {
        let mut tile = labelled_tile(&["A"]);
        tile.images.push(image("t_B02.tif", 2, 2, vec![1, 2, 3, 50_000]));
        tile.images.push(image("t_B8A.tif", 3, 1, vec![20_000, 5, 5]));

        let mut metrics = MetricsAggregator::default();
        metrics.observe_tile(&tile);

        assert_eq!(metrics.bands().get("02"), 1);
        assert_eq!(metrics.bands().get("8a"), 1);
        assert_eq!(metrics.sizes().get("2 X 2"), 1);
        assert_eq!(metrics.sizes().get("3 X 1"), 1);

        let [low, high] = metrics.histograms() else {
            panic!("expected two histograms");
        };
        assert_eq!(low.total_count(), 7);
        assert_eq!(high.total_count(), 7);
        assert_eq!(low.count(10_000), 2);
        assert_eq!(high.count(40_000), 1);
        assert_eq!(high.count(20_000), 1);
        assert_eq!(low.max(), Some(50_000));
        assert_eq!(low.total_value(), 1 + 2 + 3 + 10_000 + 10_000 + 5 + 5);
    }

    #[test]
    fn test_report_lists_sections() {
        let mut tile = labelled_tile(&["forest", "sea"]);
        tile.images.push(image("t_B02.tif", 4, 5, (0..20).collect()));

        let mut metrics = MetricsAggregator::default();
        metrics.observe_tile(&tile);
        metrics.observe_tile(&labelled_tile(&["sea"]));

        let mut out = Vec::new();
        metrics.write_report(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(report.contains("upper limit 10000"));
        assert!(report.contains("upper limit 40000"));
        assert!(report.contains("values 0-19: [1, 1, 1"));
        assert!(report.contains("median pixel value: 9.000000"));
        assert!(report.contains("mean pixel value: 9.500000"));
        assert!(report.contains("band 02: 1"));
        assert!(report.contains("size 4 X 5: 1"));
        assert!(report.contains("label sea: 2\nlabel forest: 1\n"));
        assert!(report.contains("label single sea: 1"));
    }

    #[test]
    fn test_report_on_empty_run() {
        let metrics = MetricsAggregator::default();
        let mut out = Vec::new();
        metrics.write_report(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("no pixels observed"));
    }
}
