//! Scoped artifact directory (`.vwoptimize` by default).
//!
//! Every file this process puts in the directory is prefixed with the
//! process id. On drop, all entries with that prefix are removed, including
//! files VW derives from our names (cache files and the like), so the
//! directory is left as it was found whether the run succeeded or not.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;

pub const DEFAULT_WORKDIR: &str = ".vwoptimize";

pub struct WorkDir {
    path: PathBuf,
    prefix: String,
    counter: Cell<usize>,
}

impl WorkDir {
    /// Create (if needed) and claim the directory for this run.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        debug!("using work directory {}", path.display());

        Ok(Self {
            path,
            prefix: format!("{}_", std::process::id()),
            counter: Cell::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh file path inside the directory, unique for this run.
    pub fn file(&self, stem: &str, extension: &str) -> PathBuf {
        let n = self.counter.get();
        self.counter.set(n + 1);
        self.path
            .join(format!("{}{}_{}.{}", self.prefix, n, stem, extension))
    }

    /// Remove every artifact this run produced.
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_name().to_string_lossy().starts_with(&self.prefix) {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        match self.clear() {
            Ok(n) => debug!("removed {} artifacts from {}", n, self.path.display()),
            Err(e) => warn!("failed to clean up {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let work = WorkDir::create(dir.path().join(".vwoptimize")).unwrap();
        let a = work.file("data", "vw");
        let b = work.file("data", "vw");
        assert_ne!(a, b);
        assert!(a.starts_with(work.path()));
    }

    #[test]
    fn test_drop_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".vwoptimize");
        {
            let work = WorkDir::create(&root).unwrap();
            let data = work.file("data", "vw");
            fs::write(&data, "1 | a\n").unwrap();
            // Something VW would derive from our file name
            fs::write(format!("{}.cache", data.display()), "x").unwrap();
            assert_eq!(fs::read_dir(&root).unwrap().count(), 2);
        }
        assert!(root.is_dir());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_leaves_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("work");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("keep.txt"), "x").unwrap();
        {
            let work = WorkDir::create(&root).unwrap();
            fs::write(work.file("p", "txt"), "1").unwrap();
        }
        let left: Vec<_> = fs::read_dir(&root)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(left, vec![std::ffi::OsString::from("keep.txt")]);
    }
}
