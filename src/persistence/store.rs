//! File-backed storage for codebooks and coded streams.
//!
//! Writes go to a sibling temporary file that is synced and then renamed
//! over the destination, so a failed save leaves either the previous file or
//! nothing, never a truncated one.

use super::error::{PersistenceError, PersistenceResult};
use super::format::{encode_stream_lines, CodebookFile};
use crate::quantization::{CodedStream, Codebook};

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Write `data` to `path` atomically (temp file + fsync + rename).
pub fn atomic_write(path: &Path, data: &[u8]) -> PersistenceResult<()> {
    let tmp = temp_path(path)?;
    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        // Best effort: the temp file may not exist if creation failed.
        let _ = fs::remove_file(&tmp);
        return Err(PersistenceError::Io(e));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PersistenceResult<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        PersistenceError::NotFound(format!("{} has no file name", path.display()))
    })?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

fn open(path: &Path) -> PersistenceResult<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PersistenceError::NotFound(path.display().to_string()),
        _ => PersistenceError::Io(e),
    })
}

/// Persist the full index -> centroid mapping to `path`.
pub fn save_codebook(codebook: &Codebook, path: impl AsRef<Path>) -> PersistenceResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(&CodebookFile::from(codebook))
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    atomic_write(path, &json)?;
    tracing::debug!(
        path = %path.display(),
        entries = codebook.len(),
        index_bits = codebook.index_bits(),
        "saved codebook"
    );
    Ok(())
}

/// Load a codebook written by [`save_codebook`].
pub fn load_codebook(path: impl AsRef<Path>) -> PersistenceResult<Codebook> {
    let path = path.as_ref();
    let reader = BufReader::new(open(path)?);
    let file: CodebookFile = serde_json::from_reader(reader)
        .map_err(|e| PersistenceError::Deserialization(e.to_string()))?;
    let codebook = file.into_codebook()?;
    tracing::debug!(
        path = %path.display(),
        entries = codebook.len(),
        "loaded codebook"
    );
    Ok(codebook)
}

/// Persist a coded stream, one index per line.
pub fn save_stream(stream: &CodedStream, path: impl AsRef<Path>) -> PersistenceResult<()> {
    let path = path.as_ref();
    if let Some(bad) = stream.iter().find(|s| s.contains(['\n', '\r'])) {
        return Err(PersistenceError::Serialization(format!(
            "index {bad:?} contains a line break"
        )));
    }
    atomic_write(path, encode_stream_lines(stream).as_bytes())?;
    tracing::debug!(path = %path.display(), blocks = stream.len(), "saved coded stream");
    Ok(())
}

/// Load a coded stream written by [`save_stream`], preserving line order.
pub fn load_stream(path: impl AsRef<Path>) -> PersistenceResult<CodedStream> {
    let path = path.as_ref();
    let reader = BufReader::new(open(path)?);
    let indices = reader.lines().collect::<Result<Vec<String>, _>>()?;
    tracing::debug!(path = %path.display(), blocks = indices.len(), "loaded coded stream");
    Ok(CodedStream::new(indices))
}
