// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Content-addressed copies of every reference image read.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::debug;

use clonebay_common::Archiver;

/// Stores images as `<dir>/<digest as 16 hex digits>.bin`.
pub struct DirArchive {
    dir: PathBuf,
}

impl DirArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Archiver for DirArchive {
    fn store(&mut self, bytes: &[u8], hash: u64) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{:016x}.bin", hash));

        if fs::metadata(&path).is_ok_and(|meta| meta.len() == bytes.len() as u64) {
            debug!("{} already archived", path.display());
            return Ok(path);
        }

        // The final name only ever holds a complete image.
        let partial = path.with_extension("bin.part");
        fs::write(&partial, bytes)?;
        fs::rename(&partial, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clonebay_common::hash::content_hash;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clonebay-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_store_names_entry_by_digest() {
        let dir = scratch("digest");
        let mut archive = DirArchive::new(&dir);
        let image = b"reference image".to_vec();
        let hash = content_hash(&image);

        let path = archive.store(&image, hash).unwrap();
        assert_eq!(path, dir.join(format!("{:016x}.bin", hash)));
        assert_eq!(fs::read(&path).unwrap(), image);
        assert_eq!(path.file_stem().unwrap().len(), 16);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_store_reuses_existing_entry() {
        let dir = scratch("reuse");
        let mut archive = DirArchive::new(&dir);
        let image = vec![0xA5; 4096];
        let hash = content_hash(&image);

        let first = archive.store(&image, hash).unwrap();
        let second = archive.store(&image, hash).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_store_replaces_truncated_entry() {
        let dir = scratch("truncated");
        let mut archive = DirArchive::new(&dir);
        let image = vec![0x3C; 1024];
        let hash = content_hash(&image);

        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{:016x}.bin", hash)), &image[..100]).unwrap();

        let path = archive.store(&image, hash).unwrap();
        assert_eq!(fs::read(&path).unwrap(), image);

        fs::remove_dir_all(&dir).unwrap();
    }
}
