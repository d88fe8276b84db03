use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to decode raster '{}'", path.display())]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("unsupported raster '{}': {reason}", path.display())]
    UnsupportedRaster { path: PathBuf, reason: String },

    #[error("unable to open raster dataset '{}'", path.display())]
    RasterOpen {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("unable to extract band {band} into '{}'", path.display())]
    BandExtract {
        path: PathBuf,
        band: usize,
        #[source]
        source: gdal::errors::GdalError,
    },

    #[error("unsupported data type {data_type} in band {band} of '{}'", path.display())]
    UnsupportedBandType {
        path: PathBuf,
        band: usize,
        data_type: String,
    },

    #[error("pixel buffer does not match raster dimensions")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("unable to unmarshal metadata from '{}'", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no metadata found in '{}'", path.display())]
    MissingMetadata { path: PathBuf },

    #[error("failed to read label data from '{}'", path.display())]
    LabelIndex {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("label '{0}' is not a plain folder name")]
    InvalidLabel(String),

    #[error("no {0} field found in label data")]
    MissingColumn(&'static str),

    #[error("unable to parse band mapping token '{token}': {reason}")]
    BandMapping { token: String, reason: String },

    #[error("Invalid sample rate: {0} (must be within 0 and 1)")]
    InvalidSampleRate(f64),

    #[error("Invalid {name}: {value} (must be positive)")]
    InvalidFrequency { name: &'static str, value: usize },

    #[error("Invalid upper limit list (must contain at least one value)")]
    NoUpperLimits,
}

impl TileError {
    /// Wrap an I/O error with a description of the operation that failed.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TileError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TileError>;
