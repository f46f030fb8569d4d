//! Append-only failure ledger.
//!
//! One failed cell id per line. The file handle sits behind a mutex so
//! concurrent workers never interleave partial lines.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::CellId;

/// Shared, append-only record of failed cells.
#[derive(Debug)]
pub struct FailureLedger {
    path: PathBuf,
    file: Mutex<File>,
}

impl FailureLedger {
    /// Open (creating if needed) the ledger for appending.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one cell id and flush.
    pub fn record(&self, cell_id: CellId) -> io::Result<()> {
        // A worker that panicked while holding the lock left a complete
        // line or nothing, so the file is still usable.
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(file, "{}", cell_id)?;
        file.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the ids in a ledger, skipping blank lines and repeated ids.
pub fn read_ledger(path: &Path) -> io::Result<Vec<CellId>> {
    let file = File::open(path)?;
    let mut ids = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let id: CellId = text.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}:{}: '{}' is not a cell id", path.display(), i + 1, text),
            )
        })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Move a ledger aside (`<name>.1`, `<name>.2`, ...) so a rerun starts with
/// an empty one. Returns the new location.
pub fn rotate_ledger(path: &Path) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "ledger path has no file name"))?;

    let mut n = 1;
    let rotated = loop {
        let candidate = path.with_file_name(format!("{}.{}", name, n));
        if !candidate.exists() {
            break candidate;
        }
        n += 1;
    };
    fs::rename(path, &rotated)?;
    Ok(rotated)
}
