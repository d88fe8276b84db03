use crate::decoder::decode_gray16;
use crate::error::{Result, TileError};
use crate::label_index::LabelIndex;
use log::debug;
use ndarray::Array2;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static BAND_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_B[0-9][0-9a-zA-Z][.]").expect("valid band pattern"));

const DESCRIPTOR_EXTENSION: &str = "json";

/// Labels attached to one tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Metadata {
    /// Read a `{"labels": [...]}` sidecar descriptor.
    pub fn from_descriptor(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| {
            TileError::io(format!("unable to read metadata from '{}'", path.display()), e)
        })?;
        serde_json::from_slice(&raw).map_err(|source| TileError::Descriptor {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One band image of a tile. Dimensions are zero and pixels absent until `load`.
#[derive(Debug, Clone)]
pub struct Image {
    pub band: String,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub pixels: Option<Array2<u16>>,
}

impl Image {
    pub fn new(path: PathBuf) -> Self {
        let band = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(band_code)
            .unwrap_or_default();
        Self {
            band,
            path,
            width: 0,
            height: 0,
            pixels: None,
        }
    }

    pub fn load(&mut self) -> Result<()> {
        let raster = decode_gray16(&self.path)?;
        self.width = raster.width;
        self.height = raster.height;
        self.pixels = Some(raster.pixels);
        Ok(())
    }

    /// Pixel values in row-major order; empty before loading.
    pub fn pixel_values(&self) -> impl Iterator<Item = u16> + '_ {
        self.pixels.iter().flat_map(|p| p.iter().copied())
    }
}

/// Lower-cased two character band code of a file name such as
/// `S2A_..._B8A.tif`, or an empty string when there is none.
pub fn band_code(file_name: &str) -> String {
    BAND_CODE
        .find(file_name)
        .map(|m| m.as_str()[2..4].to_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    /// A folder of single band files plus a JSON descriptor.
    Directory,
    /// One multiband raster file, labelled through a `LabelIndex`.
    MultibandFile,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub base: PathBuf,
    pub name: String,
    pub kind: TileKind,
    pub images: Vec<Image>,
    pub metadata: Option<Metadata>,
}

impl Tile {
    pub fn directory(base: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::new(base.into(), name.into(), TileKind::Directory)
    }

    pub fn multiband(base: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::new(base.into(), name.into(), TileKind::MultibandFile)
    }

    fn new(base: PathBuf, name: String, kind: TileKind) -> Self {
        Self {
            base,
            name,
            kind,
            images: Vec::new(),
            metadata: None,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base.join(&self.name)
    }

    /// File name without its extension, used to name split outputs.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    pub fn labels(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map(|m| m.labels.as_slice())
            .unwrap_or(&[])
    }

    pub fn load_metadata(&mut self, index: &LabelIndex) -> Result<()> {
        self.metadata = match self.kind {
            TileKind::Directory => {
                let descriptor = self
                    .list_files()?
                    .into_iter()
                    .find(|p| is_descriptor(p));
                match descriptor {
                    Some(path) => Some(Metadata::from_descriptor(&path)?),
                    None => None,
                }
            }
            TileKind::MultibandFile => index.get(&self.name).map(|label| Metadata {
                labels: vec![label.to_string()],
            }),
        };

        if self.metadata.is_none() {
            debug!("no metadata found for tile '{}'", self.name);
        }
        Ok(())
    }

    /// Decode every band image of a directory tile. Multiband tiles have no
    /// per-band images; their bands are handled by the splitter.
    pub fn load_images(&mut self) -> Result<()> {
        self.images.clear();
        if self.kind == TileKind::MultibandFile {
            debug!("tile '{}' is multiband, no band images to decode", self.name);
            return Ok(());
        }

        for path in self.list_files()? {
            if is_descriptor(&path) {
                continue;
            }
            let mut image = Image::new(path);
            image.load()?;
            self.images.push(image);
        }
        Ok(())
    }

    pub fn load_files(&mut self, index: &LabelIndex) -> Result<()> {
        self.load_metadata(index)?;
        self.load_images()
    }

    /// Files of a directory tile in name order.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let folder = self.path();
        let read_err =
            |e| TileError::io(format!("unable to read contents of '{}'", folder.display()), e);

        let mut files = Vec::new();
        for entry in fs::read_dir(&folder).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            if entry.file_type().map_err(read_err)?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

pub fn is_descriptor(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION)
}
