use crate::band_mapping::{BandAction, BandMapping};
use crate::error::{Result, TileError};
use crate::io::{copy_file, open_dataset, write_band, RasterMetadata};
use crate::tile::{Tile, TileKind};
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Splits multiband tiles into one GeoTIFF per retained band.
pub struct BandSplitter<'a> {
    destination: &'a Path,
    mapping: &'a BandMapping,
}

impl<'a> BandSplitter<'a> {
    pub fn new(destination: &'a Path, mapping: &'a BandMapping) -> Self {
        Self {
            destination,
            mapping,
        }
    }

    /// Folder receiving the bands of `tile`: the label when there is one,
    /// otherwise the tile name without extension.
    pub fn output_folder(&self, tile: &Tile, label: Option<&str>) -> Result<PathBuf> {
        match label {
            Some(label) if !label.is_empty() => label_folder(self.destination, label),
            _ => Ok(self.destination.join(tile.stem())),
        }
    }

    /// Write `<stem>_B<tag>.tiff` for every band the mapping keeps, in
    /// ascending band order. Returns the written paths.
    pub fn split(&self, tile: &Tile, label: Option<&str>) -> Result<Vec<PathBuf>> {
        debug_assert_eq!(tile.kind, TileKind::MultibandFile);

        let source = tile.path();
        let dataset = open_dataset(&source)?;
        let metadata = RasterMetadata::from_dataset(&dataset);

        let folder = self.output_folder(tile, label)?;
        fs::create_dir_all(&folder).map_err(|e| {
            TileError::io(format!("unable to create folder '{}'", folder.display()), e)
        })?;

        let stem = tile.stem();
        let mut written = Vec::new();
        for band_index in 1..=metadata.band_count {
            let tag = match self.mapping.action(band_index) {
                BandAction::Drop => {
                    debug!("dropping band {} of {}", band_index, tile.name);
                    continue;
                }
                BandAction::Keep(tag) => tag,
            };

            let output = folder.join(format!("{}_B{}.tiff", stem, tag));
            write_band(&dataset, band_index, &output, &metadata, &format!("B{}", tag))?;
            written.push(output);
        }

        debug!(
            "split {} into {} of {} bands under {}",
            tile.name,
            written.len(),
            metadata.band_count,
            folder.display()
        );
        Ok(written)
    }

    /// Copy the tile file unchanged to `<destination>/<label>/<name>`.
    pub fn copy(&self, tile: &Tile, label: Option<&str>) -> Result<PathBuf> {
        let folder = match label {
            Some(label) if !label.is_empty() => label_folder(self.destination, label)?,
            _ => self.destination.to_path_buf(),
        };
        let output = folder.join(&tile.name);
        copy_file(&tile.path(), &output)?;
        Ok(output)
    }
}

/// `destination/label`. Labels must stay below `destination`, so only plain
/// path components are accepted.
fn label_folder(destination: &Path, label: &str) -> Result<PathBuf> {
    let relative = Path::new(label);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(TileError::InvalidLabel(label.to_string()));
    }
    Ok(destination.join(relative))
}
