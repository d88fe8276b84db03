use crate::error::{Result, TileError};
use log::debug;
use std::collections::BTreeMap;

/// What the splitter does with one native band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandAction {
    /// Write the band under the given tag (`_B<tag>.tiff`).
    Keep(String),
    Drop,
}

/// Per-band keep/rename/drop policy keyed by 1-based native band index.
///
/// An index mapped to an empty string is dropped; an index that is not in the
/// mapping keeps its zero-padded original index as tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandMapping {
    entries: BTreeMap<usize, String>,
}

impl BandMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from the `old:new,...` rename list and the `i,j,...`
    /// drop list. Drops are applied last, so they win over renames.
    pub fn parse(band_mapping: &str, drop_bands: &str) -> Result<Self> {
        let mut mapping = Self::new();

        for token in split_list(band_mapping) {
            let (old, new) = token.split_once(':').ok_or_else(|| TileError::BandMapping {
                token: token.to_string(),
                reason: "expected '<old band>:<new band>'".to_string(),
            })?;
            let index = parse_band_index(old.trim(), token)?;
            mapping.rename(index, new.trim());
        }

        for token in split_list(drop_bands) {
            let index = parse_band_index(token, token)?;
            mapping.drop_band(index);
        }

        for (index, tag) in &mapping.entries {
            if tag.is_empty() {
                debug!("dropping band {}", index);
            } else {
                debug!("mapping band {} to {}", index, tag);
            }
        }

        Ok(mapping)
    }

    pub fn rename(&mut self, index: usize, tag: impl Into<String>) {
        self.entries.insert(index, tag.into());
    }

    pub fn drop_band(&mut self, index: usize) {
        self.entries.insert(index, String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the action for a 1-based native band index.
    pub fn action(&self, index: usize) -> BandAction {
        match self.entries.get(&index) {
            Some(tag) if tag.is_empty() => BandAction::Drop,
            Some(tag) => BandAction::Keep(tag.clone()),
            None => BandAction::Keep(format!("{:02}", index)),
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn parse_band_index(raw: &str, token: &str) -> Result<usize> {
    let index: usize = raw.parse().map_err(|e: std::num::ParseIntError| TileError::BandMapping {
        token: token.to_string(),
        reason: e.to_string(),
    })?;
    if index == 0 {
        return Err(TileError::BandMapping {
            token: token.to_string(),
            reason: "band indices start at 1".to_string(),
        });
    }
    Ok(index)
}
