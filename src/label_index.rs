use crate::error::{Result, TileError};
use log::{info, warn};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Labels of multiband tile files, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: HashMap<String, String>,
}

impl LabelIndex {
    /// Load the index from a CSV file. `None` gives an empty index.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        info!("reading labels from '{}'", path.display());

        let reader = csv::Reader::from_path(path).map_err(|source| TileError::LabelIndex {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_csv(reader, path)?;

        info!("read {} labels", index.len());
        Ok(index)
    }

    /// Parse a CSV whose header names an `image` and a `label` column.
    /// Rows that fail to parse are skipped with a warning.
    pub fn from_csv<R: Read>(mut reader: csv::Reader<R>, path: &Path) -> Result<Self> {
        let headers = reader
            .headers()
            .map_err(|source| TileError::LabelIndex {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        let label_idx = headers
            .iter()
            .position(|h| h == "label")
            .ok_or(TileError::MissingColumn("label"))?;
        let image_idx = headers
            .iter()
            .position(|h| h == "image")
            .ok_or(TileError::MissingColumn("image"))?;

        let mut labels = HashMap::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("failed to read line {} - {}", row_no + 1, e);
                    continue;
                }
            };
            match (record.get(image_idx), record.get(label_idx)) {
                (Some(image), Some(label)) => {
                    labels.insert(image.to_string(), label.to_string());
                }
                _ => warn!("line {} is missing the image or label field", row_no + 1),
            }
        }

        Ok(Self { labels })
    }

    pub fn get(&self, image: &str) -> Option<&str> {
        self.labels.get(image).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<LabelIndex> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        LabelIndex::from_csv(reader, Path::new("labels.csv"))
    }

    #[test]
    fn test_columns_in_any_order() {
        let index = parse("label,extra,image\nforest,x,T1.tiff\nsea,y,T2.tiff\n").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("T1.tiff"), Some("forest"));
        assert_eq!(index.get("T2.tiff"), Some("sea"));
        assert_eq!(index.get("T3.tiff"), None);
    }

    #[test]
    fn test_missing_label_column() {
        let err = parse("image,class\nT1.tiff,forest\n").unwrap_err();
        assert!(matches!(err, TileError::MissingColumn("label")));
    }

    #[test]
    fn test_missing_image_column() {
        let err = parse("file,label\nT1.tiff,forest\n").unwrap_err();
        assert!(matches!(err, TileError::MissingColumn("image")));
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let index = parse("image,label\nT1.tiff\nT2.tiff,sea\n").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("T2.tiff"), Some("sea"));
    }

    #[test]
    fn test_no_path_gives_empty_index() {
        let index = LabelIndex::load(None).unwrap();
        assert!(index.is_empty());
    }
}
