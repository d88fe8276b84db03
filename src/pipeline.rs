//! Command pipelines: enumerate a corpus folder and feed each sampled entry
//! to the splitter, the metrics aggregator or the restructurer.
//!
//! Every pipeline stops at the first error.

use crate::band_mapping::BandMapping;
use crate::cli::{MetricsArgs, SampleArgs, SplitArgs};
use crate::error::{Result, TileError};
use crate::label_index::LabelIndex;
use crate::metrics::MetricsAggregator;
use crate::restructure::{copy_tile, select_labels};
use crate::sampling::Sampler;
use crate::splitter::BandSplitter;
use crate::tile::Tile;
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::Path;

const PROGRESS_FREQUENCY: usize = 10_000;

/// One entry of a corpus folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub name: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub seen: usize,
    pub processed: usize,
}

/// List a corpus folder in name order.
pub fn list_corpus(folder: &Path) -> Result<Vec<CorpusEntry>> {
    let read_err =
        |e| TileError::io(format!("unable to read contents of '{}'", folder.display()), e);

    let mut entries = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        entries.push(CorpusEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: entry.file_type().map_err(read_err)?.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn check_frequency(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(TileError::InvalidFrequency { name, value });
    }
    Ok(())
}

/// Split (or copy) every sampled multiband file of `args.source`.
pub fn run_split(args: &SplitArgs, sampler: &mut Sampler) -> Result<RunSummary> {
    check_frequency("log frequency", args.log_frequency)?;
    let labels = LabelIndex::load(args.label_data.as_deref())?;
    let mapping = BandMapping::parse(&args.band_mapping, &args.drop_bands)?;

    info!(
        "splitting tiles found in '{}', outputting resulting images to '{}' (log frequency = {}, sample = {}, split = {})",
        args.source.display(),
        args.destination.display(),
        args.log_frequency,
        sampler.rate(),
        args.split
    );
    let entries = list_corpus(&args.source)?;
    info!("read {} tile images", entries.len());

    let splitter = BandSplitter::new(&args.destination, &mapping);
    let mut summary = RunSummary::default();
    for entry in entries {
        summary.seen += 1;
        if summary.seen % args.log_frequency == 0 {
            info!("processed {} tiles", summary.seen);
        }

        if !sampler.include() {
            continue;
        }
        if entry.is_dir {
            debug!("skipping folder '{}'", entry.name);
            continue;
        }

        let tile = Tile::multiband(&args.source, &entry.name);
        let label = labels.get(&entry.name);
        if args.split {
            splitter.split(&tile, label)?;
        } else {
            splitter.copy(&tile, label)?;
        }
        summary.processed += 1;
    }

    info!(
        "done splitting tiles ({} of {} processed)",
        summary.processed, summary.seen
    );
    Ok(summary)
}

/// Aggregate statistics over every sampled tile, writing a report to `out`
/// every `args.output_frequency` tiles and once at the end.
pub fn run_metrics<W: Write>(
    args: &MetricsArgs,
    sampler: &mut Sampler,
    out: &mut W,
) -> Result<(RunSummary, MetricsAggregator)> {
    check_frequency("output frequency", args.output_frequency)?;
    if args.upper_limits.is_empty() {
        return Err(TileError::NoUpperLimits);
    }
    let labels = LabelIndex::load(args.label_data.as_deref())?;

    info!(
        "processing folder '{}' (first only: {}, metadata only: {}, sample = {}), outputting metrics every {}",
        args.source.display(),
        args.first_only,
        args.metadata_only,
        sampler.rate(),
        args.output_frequency
    );
    let entries = list_corpus(&args.source)?;
    info!("read {} captures", entries.len());

    let mut aggregator = MetricsAggregator::new(&args.upper_limits, args.first_only);
    let mut summary = RunSummary::default();
    for entry in entries {
        summary.seen += 1;
        if !sampler.include() {
            continue;
        }

        let mut tile = if entry.is_dir {
            Tile::directory(&args.source, &entry.name)
        } else {
            Tile::multiband(&args.source, &entry.name)
        };
        if args.metadata_only {
            tile.load_metadata(&labels)?;
        } else {
            tile.load_files(&labels)?;
        }
        aggregator.observe_tile(&tile);
        summary.processed += 1;

        if summary.processed % PROGRESS_FREQUENCY == 0 {
            info!("count {} tiles", summary.processed);
        }
        if summary.processed % args.output_frequency == 0 {
            write_report(&aggregator, out)?;
        }
    }

    write_report(&aggregator, out)?;
    Ok((summary, aggregator))
}

fn write_report<W: Write>(aggregator: &MetricsAggregator, out: &mut W) -> Result<()> {
    aggregator
        .write_report(out)
        .and_then(|_| out.flush())
        .map_err(|e| TileError::io("unable to write metrics report", e))
}

/// Copy every sampled tile folder into one folder per label.
pub fn run_sample(args: &SampleArgs, sampler: &mut Sampler) -> Result<RunSummary> {
    fs::create_dir_all(&args.destination).map_err(|e| {
        TileError::io(
            format!("unable to create folder '{}'", args.destination.display()),
            e,
        )
    })?;

    info!(
        "processing folder '{}' with sample rate {} (first only: {}, single only: {})",
        args.source.display(),
        sampler.rate(),
        args.first_only,
        args.single_only
    );
    let entries = list_corpus(&args.source)?;
    info!("read {} captures", entries.len());

    let no_labels = LabelIndex::default();
    let mut summary = RunSummary::default();
    for entry in entries {
        summary.seen += 1;
        if !sampler.include() {
            continue;
        }
        if !entry.is_dir {
            debug!("skipping file '{}'", entry.name);
            continue;
        }

        let mut tile = Tile::directory(&args.source, &entry.name);
        tile.load_metadata(&no_labels)?;
        if tile.metadata.is_none() {
            return Err(TileError::MissingMetadata { path: tile.path() });
        }

        let labels = tile.labels();
        if args.single_only && labels.len() != 1 {
            continue;
        }
        copy_tile(&tile, &args.destination, select_labels(labels, args.first_only))?;

        summary.processed += 1;
        if summary.processed % PROGRESS_FREQUENCY == 0 {
            info!("processed {}", summary.processed);
        }
    }

    info!(
        "done sampling ({} of {} tiles copied)",
        summary.processed, summary.seen
    );
    Ok(summary)
}
