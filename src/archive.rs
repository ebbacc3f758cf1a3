//! Raw document boundary: reading the inner document out of an export and
//! writing a new export.
//!
//! Output is staged in a temporary file next to the destination and only
//! renamed into place once fully written, so a failed run never leaves a
//! truncated file behind.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{VaultError, VaultResult};

/// Where a format keeps its document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// A zip archive holding the document at a fixed inner path.
    Zip { inner_path: &'static str },
    /// The document is the file itself.
    PlainFile,
}

impl ArchiveLayout {
    /// Read the raw document from `path`.
    pub fn read_document(&self, path: &Path) -> VaultResult<Vec<u8>> {
        let context = path.display().to_string();
        match self {
            ArchiveLayout::Zip { inner_path } => {
                let mut archive = open_zip(path)?;
                let mut entry = match archive.by_name(inner_path) {
                    Ok(entry) => entry,
                    Err(ZipError::FileNotFound) => {
                        return Err(VaultError::format(
                            context,
                            format!("archive has no '{}'", inner_path),
                        ))
                    }
                    Err(e) => return Err(VaultError::format(context, e.to_string())),
                };
                let mut bytes = Vec::new();
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|e| VaultError::format(&context, format!("cannot read '{}': {}", inner_path, e)))?;
                tracing::debug!(archive = %context, entry = inner_path, bytes = bytes.len(), "read inner document");
                Ok(bytes)
            }
            ArchiveLayout::PlainFile => {
                std::fs::read(path).map_err(|e| VaultError::format(context, format!("cannot read: {}", e)))
            }
        }
    }

    /// Write `document` to `dest`, staged through a temporary file.
    ///
    /// For zip layouts, every entry of the `source` archive other than the
    /// document itself is copied across unchanged.
    pub fn write_document(&self, source: &Path, dest: &Path, document: &[u8]) -> VaultResult<()> {
        let io_err = |e: &dyn std::fmt::Display| VaultError::Io {
            path: dest.display().to_string(),
            reason: e.to_string(),
        };

        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| io_err(&e))?;

        match self {
            ArchiveLayout::Zip { inner_path } => {
                write_zip(staged.as_file_mut(), source, inner_path, document).map_err(|e| io_err(&e))?;
            }
            ArchiveLayout::PlainFile => {
                staged.write_all(document).map_err(|e| io_err(&e))?;
            }
        }

        staged.as_file().sync_all().map_err(|e| io_err(&e))?;
        staged.persist(dest).map_err(|e| io_err(&e.error))?;
        tracing::debug!(output = %dest.display(), "committed output");
        Ok(())
    }
}

fn open_zip(path: &Path) -> VaultResult<ZipArchive<File>> {
    let context = path.display().to_string();
    let file = File::open(path).map_err(|e| VaultError::format(&context, format!("cannot open: {}", e)))?;
    ZipArchive::new(file).map_err(|e| VaultError::format(&context, format!("not a valid zip archive: {}", e)))
}

fn write_zip(out: &mut File, source: &Path, inner_path: &str, document: &[u8]) -> Result<(), ZipError> {
    let mut source = ZipArchive::new(File::open(source)?)?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(out);

    let inner_dir = inner_path.rsplit_once('/').map(|(dir, _)| format!("{}/", dir));
    if let Some(dir) = &inner_dir {
        writer.add_directory(dir.as_str(), options)?;
    }
    writer.start_file(inner_path, options)?;
    writer.write_all(document)?;

    // Attachments and anything else the export carries.
    for index in 0..source.len() {
        let entry = source.by_index_raw(index)?;
        let name = entry.name();
        if name == inner_path || Some(name) == inner_dir.as_deref() {
            continue;
        }
        writer.raw_copy_file(entry)?;
    }

    writer.finish()?;
    Ok(())
}
