// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory file locks with a human-readable holder stamp.
//!
//! The holder writes its pid and a timestamp into the file so an operator
//! (or a watchdog) can judge staleness; release truncates the file, which
//! is how observers tell "held" from "free". Contention on a nonblocking
//! acquire is a normal `Ok(None)`, never an error.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An exclusive advisory lock on a path.
///
/// Dropping the handle releases the lock; prefer [`FileLock::release`] so
/// the stamp is truncated as well.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire the lock, blocking until it is free.
    pub fn acquire(path: &Path) -> io::Result<FileLock> {
        let file = Self::open(path)?;
        file.lock_exclusive()?;
        Self::stamped(file, path)
    }

    /// Try to acquire without blocking. `Ok(None)` means another process
    /// holds the lock.
    pub fn try_acquire(path: &Path) -> io::Result<Option<FileLock>> {
        let file = Self::open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Self::stamped(file, path).map(Some),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
    }

    fn stamped(mut file: File, path: &Path) -> io::Result<FileLock> {
        let stamp = format!("{} {}\n", std::process::id(), epoch_secs());
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(stamp.as_bytes())?;
        file.flush()?;
        Ok(FileLock {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Release the lock, truncating the stamp so observers see it free.
    pub fn release(self) -> io::Result<()> {
        self.file.set_len(0)?;
        fs2::FileExt::unlock(&self.file)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the holder stamp of a lock file, if any.
    pub fn read_stamp(path: &Path) -> io::Result<Option<String>> {
        match File::open(path) {
            Ok(mut file) => {
                let mut stamp = String::new();
                file.read_to_string(&mut stamp)?;
                let stamp = stamp.trim().to_string();
                Ok((!stamp.is_empty()).then_some(stamp))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn epoch_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "file_lock_tests.rs"]
mod tests;
