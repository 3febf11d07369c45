//! Atomic JSON file persistence.
//!
//! Every durable artifact in the system (transaction history, bank accounts,
//! user registry, pending client queue) is a single JSON array rewritten
//! whole on each change. The rewrite goes through `<file>.tmp` followed by a
//! rename so a crash mid-write never leaves a torn file; a stale `.tmp` from
//! a crashed writer is discarded on the next load.

use std::fs;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Load a JSON value from `path`.
///
/// A missing file yields `T::default()` (first run). A leftover `.tmp`
/// sibling is removed before reading.
pub fn load_json<T>(path: &Path) -> io::Result<T>
where
    T: DeserializeOwned + Default,
{
    discard_stale_tmp(path);

    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e),
    };

    serde_json::from_slice(&data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write `value` to `path` via temp-and-rename.
pub fn store_json<T>(path: &Path, value: &T) -> io::Result<()>
where
    T: Serialize,
{
    let data = serde_json::to_vec_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, &data)?;
    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    std::path::PathBuf::from(os)
}

fn discard_stale_tmp(path: &Path) {
    let tmp = tmp_path(path);
    if tmp.exists() {
        warn!(path = %tmp.display(), "Discarding stale temp file from interrupted write");
        let _ = fs::remove_file(&tmp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let v: Vec<String> = load_json(&path).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn store_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let v = vec!["a".to_string(), "b".to_string()];
        store_json(&path, &v).unwrap();

        let back: Vec<String> = load_json(&path).unwrap();
        assert_eq!(back, v);

        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn stale_tmp_is_discarded_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        store_json(&path, &vec![1u32, 2, 3]).unwrap();

        // Simulate a crash that left a half-written temp file
        let tmp = super::tmp_path(&path);
        fs::write(&tmp, b"{ torn").unwrap();

        let back: Vec<u32> = load_json(&path).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        assert!(!tmp.exists());
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, b"not json").unwrap();

        let res: io::Result<Vec<u32>> = load_json(&path);
        assert!(res.is_err());
    }
}
