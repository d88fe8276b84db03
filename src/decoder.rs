//! Single-band 16-bit raster decoding (without GDAL)
//!
//! Per-band tile files are plain 16-bit grayscale TIFFs, so they are read with
//! the `tiff` crate. Multiband rasters go through GDAL in `splitter`.

use crate::error::{Result, TileError};
use log::debug;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::{ColorType, TiffError};

/// A decoded single-band raster, pixels stored row-major as `(height, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRaster {
    pub width: usize,
    pub height: usize,
    pub pixels: Array2<u16>,
}

/// Decode a single-band 16-bit grayscale raster from disk.
pub fn decode_gray16(path: &Path) -> Result<DecodedRaster> {
    let file = File::open(path).map_err(|e| TileError::Tiff {
        path: path.to_path_buf(),
        source: TiffError::IoError(e),
    })?;
    decode_gray16_from_reader(BufReader::new(file), path)
}

/// Decode from any `Read + Seek` source. `path` is only used in error messages.
pub fn decode_gray16_from_reader<R: Read + Seek>(reader: R, path: &Path) -> Result<DecodedRaster> {
    let tiff_err = |source| TileError::Tiff {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = Decoder::new(reader).map_err(tiff_err)?;

    match decoder.colortype().map_err(tiff_err)? {
        ColorType::Gray(16) => {}
        other => {
            return Err(TileError::UnsupportedRaster {
                path: path.to_path_buf(),
                reason: format!("expected single band 16-bit grayscale, found {:?}", other),
            })
        }
    }

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;
    let (width, height) = (width as usize, height as usize);

    let samples = match decoder.read_image().map_err(tiff_err)? {
        DecodingResult::U16(buf) => buf,
        _ => {
            return Err(TileError::UnsupportedRaster {
                path: path.to_path_buf(),
                reason: "sample buffer is not unsigned 16-bit".to_string(),
            })
        }
    };

    let pixels = compose_pixels(&gray16_buffer(&samples), width * height);
    debug!("decoded {} ({}x{})", path.display(), width, height);

    Ok(DecodedRaster {
        width,
        height,
        pixels: Array2::from_shape_vec((height, width), pixels)?,
    })
}

/// Backing buffer of a Gray16 image: two bytes per sample, most significant first.
fn gray16_buffer(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_be_bytes()).collect()
}

/// Build `count` pixel values from a Gray16 backing buffer as
/// `(byte0 << 8) | byte1` for each consecutive byte pair.
pub fn compose_pixels(buffer: &[u8], count: usize) -> Vec<u16> {
    buffer
        .chunks_exact(2)
        .take(count)
        .map(|pair| (pair[0] as u16) << 8 | pair[1] as u16)
        .collect()
}
