// SPDX-License-Identifier: GPL-3.0-or-later
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

/// Per-scan temporary directory, removed when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("mix-id-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Slot for one segment's samples. Only one is live at a time.
    pub fn segment_file(&self) -> SegmentFile {
        SegmentFile {
            path: self.dir.path().join("seg.raw"),
        }
    }
}

/// A segment's sample file; deleted on drop whatever the exit path.
#[derive(Debug)]
pub struct SegmentFile {
    path: PathBuf,
}

impl SegmentFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the samples, then release the file.
    pub async fn read(self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

impl Drop for SegmentFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(target: "scanner", path = ?self.path, error = %err, "failed to remove segment file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_releases_the_file() {
        let scratch = ScratchDir::new().unwrap();
        let segment = scratch.segment_file();
        let path = segment.path().to_path_buf();
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let bytes = segment.read().await.unwrap();

        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert!(!path.exists());
    }

    #[test]
    fn drop_without_read_releases_the_file() {
        let scratch = ScratchDir::new().unwrap();
        let path = {
            let segment = scratch.segment_file();
            std::fs::write(segment.path(), b"pcm").unwrap();
            segment.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn drop_of_never_written_file_is_quiet() {
        let scratch = ScratchDir::new().unwrap();
        drop(scratch.segment_file());
    }

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());
        drop(scratch);
        assert!(!path.exists());
    }
}
