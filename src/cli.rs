use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tile-restructure")]
#[command(about = "Split, sample and profile corpora of multi-band satellite image tiles")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split multiband tiles into one GeoTIFF per band (or copy them by label)
    Split(SplitArgs),
    /// Report band, size, label and pixel value statistics of a corpus
    Metrics(MetricsArgs),
    /// Copy a random sample of tile folders into one folder per label
    Sample(SampleArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SplitArgs {
    /// Folder containing the multiband tile images
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,

    /// Output folder for the split tiles
    #[arg(long, value_name = "DIR")]
    pub destination: PathBuf,

    /// CSV file with `image` and `label` columns
    #[arg(long, value_name = "FILE")]
    pub label_data: Option<PathBuf>,

    /// Log progress every N tiles
    #[arg(long, value_name = "N", default_value_t = 500)]
    pub log_frequency: usize,

    /// Probability (0 to 1) that a tile is processed
    #[arg(long, value_name = "RATE", default_value_t = 1.0)]
    pub sample: f64,

    /// Comma separated band indices to drop when splitting (e.g. "1,10")
    #[arg(long, value_name = "LIST", default_value = "")]
    pub drop_bands: String,

    /// Comma separated band renames as old:new (e.g. "9:8A,10:09")
    #[arg(long, value_name = "LIST", default_value = "")]
    pub band_mapping: String,

    /// Split multiband images into bands; without it tiles are copied
    #[arg(long)]
    pub split: bool,

    /// Seed for the sampling random generator
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MetricsArgs {
    /// Folder containing the tiles (folders or multiband files)
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,

    /// Only count the first label of each tile
    #[arg(long)]
    pub first_only: bool,

    /// Only load metadata, skipping image decoding
    #[arg(long)]
    pub metadata_only: bool,

    /// Print the report every N processed tiles
    #[arg(long, value_name = "N", default_value_t = 10_000)]
    pub output_frequency: usize,

    /// Probability (0 to 1) that a tile is processed
    #[arg(long, value_name = "RATE", default_value_t = 1.0)]
    pub sample: f64,

    /// CSV file labelling multiband tile files
    #[arg(long, value_name = "FILE")]
    pub label_data: Option<PathBuf>,

    /// Histogram upper limits, one report section per limit
    #[arg(long, value_name = "LIST", value_delimiter = ',', default_value = "10000,40000")]
    pub upper_limits: Vec<u16>,

    /// Seed for the sampling random generator
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SampleArgs {
    /// Folder containing the tile folders
    #[arg(long, value_name = "DIR")]
    pub source: PathBuf,

    /// Folder to write the restructured data
    #[arg(long, value_name = "DIR")]
    pub destination: PathBuf,

    /// Probability (0 to 1) that a tile is copied
    #[arg(long, value_name = "RATE", default_value_t = 0.0001)]
    pub sample: f64,

    /// Only file each tile under its first label
    #[arg(long)]
    pub first_only: bool,

    /// Only consider tiles with exactly one label
    #[arg(long)]
    pub single_only: bool,

    /// Seed for the sampling random generator
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_defaults() {
        let args = Args::parse_from([
            "tile-restructure",
            "split",
            "--source",
            "in",
            "--destination",
            "out",
        ]);
        let Command::Split(split) = args.command else {
            panic!("expected split");
        };
        assert_eq!(split.log_frequency, 500);
        assert_eq!(split.sample, 1.0);
        assert!(!split.split);
        assert!(split.drop_bands.is_empty());
    }

    #[test]
    fn test_metrics_upper_limits() {
        let args = Args::parse_from([
            "tile-restructure",
            "-v",
            "metrics",
            "--source",
            "in",
            "--upper-limits",
            "500,2000,65535",
        ]);
        assert!(args.verbose);
        let Command::Metrics(metrics) = args.command else {
            panic!("expected metrics");
        };
        assert_eq!(metrics.upper_limits, vec![500, 2000, 65535]);
        assert_eq!(metrics.output_frequency, 10_000);
    }

    #[test]
    fn test_sample_requires_destination() {
        let result = Args::try_parse_from(["tile-restructure", "sample", "--source", "in"]);
        assert!(result.is_err());
    }
}
