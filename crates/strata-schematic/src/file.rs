//! Reading and writing structure files.
//!
//! Both formats are stored as a sealed LZ4 tag container on disk. Native
//! structure files use the `.strata` extension, legacy exports `.schem`.

use std::fs;
use std::path::{Path, PathBuf};

use strata_tag::{ContainerError, TagError};
use tracing::info;

use crate::codec::{self, CodecError};
use crate::legacy::{self, LegacyDocument, LegacyError, LegacyRegistry};
use crate::state::BlockState;
use crate::structure::Structure;

/// Extension of native structure files.
pub const EXTENSION: &str = "strata";

/// Extension of legacy schematic exports.
pub const LEGACY_EXTENSION: &str = "schem";

/// Errors produced by file save/load.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The destination exists and overwriting was not requested.
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Legacy(#[from] LegacyError),
}

fn destination(dir: &Path, file_name: &str, extension: &str) -> PathBuf {
    let mut path = dir.join(file_name);
    if path.extension().is_none_or(|e| e != extension) {
        let with_ext = format!("{file_name}.{extension}");
        path = dir.join(with_ext);
    }
    path
}

/// Saves a structure to `dir/file_name`, appending the native extension if
/// absent. On success the structure remembers its file and is marked saved.
pub fn save_structure<S: BlockState>(
    structure: &mut Structure<S>,
    dir: &Path,
    file_name: &str,
    overwrite: bool,
) -> Result<PathBuf, FileError> {
    let path = destination(dir, file_name, EXTENSION);
    if path.exists() && !overwrite {
        return Err(FileError::AlreadyExists(path));
    }
    fs::create_dir_all(dir)?;

    let document = codec::write_structure(structure);
    let bytes = strata_tag::seal(&strata_tag::to_bytes(&document));
    fs::write(&path, bytes)?;

    structure.set_file(Some(path.clone()));
    structure.metadata_mut().mark_saved();
    info!(path = %path.display(), "saved structure");
    Ok(path)
}

/// Loads a structure from a native file. The loaded structure remembers its
/// file and starts out unmodified.
pub fn load_structure<S: BlockState>(path: &Path) -> Result<Structure<S>, FileError> {
    let bytes = fs::read(path)?;
    let document = strata_tag::from_bytes(&strata_tag::open(&bytes)?)?;
    let mut structure = codec::read_structure(&document)?;
    structure.set_file(Some(path.to_path_buf()));
    structure.metadata_mut().mark_saved();
    Ok(structure)
}

/// Saves a legacy document to `dir/file_name` with the legacy extension.
pub fn save_legacy<S: BlockState, R: LegacyRegistry<S>>(
    doc: &LegacyDocument<S>,
    registry: &R,
    dir: &Path,
    file_name: &str,
    overwrite: bool,
) -> Result<PathBuf, FileError> {
    let path = destination(dir, file_name, LEGACY_EXTENSION);
    if path.exists() && !overwrite {
        return Err(FileError::AlreadyExists(path));
    }
    fs::create_dir_all(dir)?;

    let document = legacy::write_legacy(doc, registry)?;
    let bytes = strata_tag::seal(&strata_tag::to_bytes(&document));
    fs::write(&path, bytes)?;
    info!(path = %path.display(), "saved legacy schematic");
    Ok(path)
}

/// Loads a legacy document from a file.
pub fn load_legacy<S: BlockState, R: LegacyRegistry<S>>(
    path: &Path,
    registry: &R,
) -> Result<LegacyDocument<S>, FileError> {
    let bytes = fs::read(path)?;
    let document = strata_tag::from_bytes(&strata_tag::open(&bytes)?)?;
    Ok(legacy::read_legacy(&document, registry)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
