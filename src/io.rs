use crate::error::{Result, TileError};
use gdal::errors::GdalError;
use gdal::raster::{GdalDataType, GdalType, RasterBand};
use gdal::{Dataset, DriverManager, Metadata};
use log::debug;
use std::fs;
use std::path::Path;

/// Georeferencing shared by every band of a dataset, copied onto split outputs.
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub band_count: usize,
    pub geotransform: Option<[f64; 6]>,
    pub projection: String,
}

impl RasterMetadata {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            band_count: dataset.raster_count() as usize,
            geotransform: dataset.geo_transform().ok(),
            projection: dataset.projection(),
        }
    }
}

/// Open a raster dataset read-only.
pub fn open_dataset(path: &Path) -> Result<Dataset> {
    debug!("Opening raster: {}", path.display());
    Dataset::open(path).map_err(|source| TileError::RasterOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Write band `band_index` of `dataset` as a single band GeoTIFF at `path`,
/// keeping its data type, nodata value and the dataset georeferencing.
pub fn write_band(
    dataset: &Dataset,
    band_index: usize,
    path: &Path,
    metadata: &RasterMetadata,
    description: &str,
) -> Result<()> {
    let extract_err = |source| TileError::BandExtract {
        path: path.to_path_buf(),
        band: band_index,
        source,
    };

    let band = dataset.rasterband(band_index).map_err(extract_err)?;
    let written = match band.band_type() {
        GdalDataType::UInt8 => copy_band::<u8>(&band, path, metadata, description),
        GdalDataType::UInt16 => copy_band::<u16>(&band, path, metadata, description),
        GdalDataType::Int16 => copy_band::<i16>(&band, path, metadata, description),
        GdalDataType::UInt32 => copy_band::<u32>(&band, path, metadata, description),
        GdalDataType::Int32 => copy_band::<i32>(&band, path, metadata, description),
        GdalDataType::Float32 => copy_band::<f32>(&band, path, metadata, description),
        GdalDataType::Float64 => copy_band::<f64>(&band, path, metadata, description),
        other => {
            return Err(TileError::UnsupportedBandType {
                path: path.to_path_buf(),
                band: band_index,
                data_type: format!("{:?}", other),
            })
        }
    };
    written.map_err(extract_err)
}

fn copy_band<T: GdalType + Copy>(
    band: &RasterBand,
    path: &Path,
    metadata: &RasterMetadata,
    description: &str,
) -> std::result::Result<(), GdalError> {
    let (width, height) = band.size();
    let mut buffer = band.read_as::<T>((0, 0), (width, height), (width, height), None)?;

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut output = driver.create_with_band_type::<T, _>(path, width, height, 1)?;

    if let Some(geotransform) = &metadata.geotransform {
        output.set_geo_transform(geotransform)?;
    }
    if !metadata.projection.is_empty() {
        output.set_projection(&metadata.projection)?;
    }

    let mut output_band = output.rasterband(1)?;
    output_band.write((0, 0), (width, height), &mut buffer)?;
    output_band.set_description(description)?;
    if let Some(nodata) = band.no_data_value() {
        output_band.set_no_data_value(Some(nodata))?;
    }

    debug!("Wrote {}x{} band to {}", width, height, path.display());
    Ok(())
}

/// Copy a file byte for byte, creating the destination folder if needed.
pub fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TileError::io(
                format!("unable to make destination folder '{}'", parent.display()),
                e,
            )
        })?;
    }
    fs::copy(source, destination).map_err(|e| {
        TileError::io(
            format!(
                "unable to copy '{}' to '{}'",
                source.display(),
                destination.display()
            ),
            e,
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::raster::Buffer;
    use tempfile::TempDir;

    #[test]
    fn test_write_band_keeps_values_and_description() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("multi.tiff");
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let dataset = driver
            .create_with_band_type::<u16, _>(&source, 3, 2, 2)
            .unwrap();
        for b in 1..=2usize {
            let data: Vec<u16> = (0..6).map(|i| (b * 10 + i) as u16).collect();
            let mut buffer = Buffer::new((3, 2), data);
            let mut band = dataset.rasterband(b).unwrap();
            band.write((0, 0), (3, 2), &mut buffer).unwrap();
            band.set_no_data_value(Some(0.0)).unwrap();
        }
        drop(dataset);

        let dataset = open_dataset(&source).unwrap();
        let metadata = RasterMetadata::from_dataset(&dataset);
        assert_eq!(metadata.band_count, 2);

        let output = dir.path().join("single_B02.tiff");
        write_band(&dataset, 2, &output, &metadata, "B02").unwrap();

        let written = Dataset::open(&output).unwrap();
        assert_eq!(written.raster_count(), 1);
        let band = written.rasterband(1).unwrap();
        assert_eq!(band.description().unwrap(), "B02");
        assert_eq!(band.no_data_value(), Some(0.0));
        let values = band.read_as::<u16>((0, 0), (3, 2), (3, 2), None).unwrap();
        assert_eq!(values.data().to_vec(), vec![20, 21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_copy_file_creates_folder() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.bin");
        fs::write(&source, [1u8, 2, 3]).unwrap();

        let destination = dir.path().join("a").join("b").join("in.bin");
        copy_file(&source, &destination).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let err = copy_file(&dir.path().join("nope"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, TileError::Io { .. }));
    }

    #[test]
    fn test_open_missing_dataset() {
        let err = open_dataset(Path::new("/nonexistent/T1.tiff")).unwrap_err();
        assert!(matches!(err, TileError::RasterOpen { .. }));
    }
}
