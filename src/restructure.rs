use crate::error::Result;
use crate::io::copy_file;
use crate::tile::{is_descriptor, Tile};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static LABEL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]").expect("valid label pattern"));

/// Folder name for a label: every non alphanumeric character becomes `_`.
pub fn clean_label(label: &str) -> String {
    LABEL_CHARS.replace_all(label, "_").into_owned()
}

/// Labels a tile is filed under.
pub fn select_labels(labels: &[String], first_only: bool) -> &[String] {
    if first_only && labels.len() > 1 {
        &labels[..1]
    } else {
        labels
    }
}

/// Copy every band file of a directory tile into `<destination>/<clean label>/`
/// for each label. Returns the copied paths.
pub fn copy_tile(tile: &Tile, destination: &Path, labels: &[String]) -> Result<Vec<PathBuf>> {
    let folders: Vec<PathBuf> = labels
        .iter()
        .map(|l| clean_label(l))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|l| destination.join(l))
        .collect();

    let mut copied = Vec::new();
    for file in tile.list_files()? {
        if is_descriptor(&file) {
            continue;
        }
        let Some(name) = file.file_name() else {
            continue;
        };
        for folder in &folders {
            let output = folder.join(name);
            copy_file(&file, &output)?;
            copied.push(output);
        }
    }
    Ok(copied)
}
