use crate::errors::StoreError;
use crate::query::SemanticIndex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    format_version: u32,
    index: &'a SemanticIndex,
}

#[derive(Deserialize)]
struct IndexFile {
    format_version: u32,
    index: SemanticIndex,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes the index next to its final location, then renames it into place,
/// so a crash never leaves a truncated blob at `path`.
pub fn write_index(path: &Path, index: &SemanticIndex) -> Result<(), StoreError> {
    let tmp = temp_path(path);
    {
        let file = File::create(&tmp)
            .map_err(|e| StoreError::Io(format!("create {}: {e}", tmp.display())))?;
        let mut out = BufWriter::new(file);
        let blob = IndexFileRef {
            format_version: FORMAT_VERSION,
            index,
        };
        bincode::serialize_into(&mut out, &blob)
            .map_err(|e| StoreError::Io(format!("encode index: {e}")))?;
        out.flush()?;
    }
    fs::rename(&tmp, path)
        .map_err(|e| StoreError::Io(format!("rename {} -> {}: {e}", tmp.display(), path.display())))?;
    Ok(())
}

pub fn read_index(path: &Path) -> Result<SemanticIndex, StoreError> {
    let file = File::open(path)
        .map_err(|e| StoreError::ArtifactMismatch(format!("index {} unreadable: {e}", path.display())))?;
    let blob: IndexFile = bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| StoreError::Corrupt(format!("index {}: {e}", path.display())))?;

    if blob.format_version != FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "index format version {} (expected {FORMAT_VERSION})",
            blob.format_version
        )));
    }
    if !blob.index.is_well_formed() {
        return Err(StoreError::Corrupt("index vectors do not match its ids".into()));
    }
    Ok(blob.index)
}
