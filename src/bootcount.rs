//! Persisted bootcount file. See spec §6.8.
//!
//! Grounded on the teacher's `cfg_storage.rs` persistence pattern, moved
//! from flash pages to a filesystem temp-file-then-rename, the idiomatic
//! `std` equivalent of atomic persistence.

use std::path::Path;

/// Reads the bootcount file (a single-line text integer, defaulting to 0 if
/// absent), increments it, and atomically rewrites it. Returns the
/// incremented value.
pub fn increment(path: &Path) -> std::io::Result<u64> {
    let current = match std::fs::read_to_string(path) {
        Ok(text) => text.trim().parse().unwrap_or(0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e),
    };
    let next = current + 1;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, format!("{next}\n"))?;
    std::fs::rename(&tmp_path, path)?;

    Ok(next)
}
