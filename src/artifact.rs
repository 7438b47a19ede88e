//! Single-use artifact handles backed by temporary files.
//!
//! A converted file is written to a [`tempfile::NamedTempFile`] as soon as it
//! arrives, so the task holds a path rather than a buffer. The handle can be
//! retrieved exactly once; releasing or dropping it deletes the file.

use crate::error::TypeShiftError;
use crate::task::DownloadableArtifact;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Owner of the bytes behind a [`DownloadableArtifact`].
#[derive(Debug)]
pub struct ArtifactHandle {
    id: u64,
    suggested_filename: String,
    size: u64,
    location: PathBuf,
    file: Option<NamedTempFile>,
}

impl ArtifactHandle {
    /// Write `bytes` to a fresh temporary file.
    pub(crate) fn create(
        id: u64,
        suggested_filename: String,
        bytes: &[u8],
    ) -> Result<Self, TypeShiftError> {
        let suffix = Path::new(&suggested_filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut tmp = tempfile::Builder::new()
            .prefix("typeshift-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| TypeShiftError::ArtifactIo {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let location = tmp.path().to_path_buf();
        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| TypeShiftError::ArtifactIo {
                path: location.clone(),
                source: e,
            })?;

        debug!(
            "Artifact #{} stored at {} ({} bytes)",
            id,
            location.display(),
            bytes.len()
        );

        Ok(Self {
            id,
            suggested_filename,
            size: bytes.len() as u64,
            location,
            file: Some(tmp),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    pub fn is_live(&self) -> bool {
        self.file.is_some()
    }

    pub fn describe(&self) -> DownloadableArtifact {
        DownloadableArtifact {
            id: self.id,
            location: self.location.clone(),
            suggested_filename: self.suggested_filename.clone(),
            size_bytes: self.size,
            consumed: self.file.is_none(),
        }
    }

    /// Claim the backing file. Fails on every call after the first.
    pub(crate) fn claim(&mut self) -> Result<ClaimedArtifact, TypeShiftError> {
        let file = self
            .file
            .take()
            .ok_or_else(|| TypeShiftError::ArtifactConsumed {
                filename: self.suggested_filename.clone(),
            })?;
        Ok(ClaimedArtifact {
            suggested_filename: self.suggested_filename.clone(),
            file,
        })
    }

    /// Delete the backing file if it is still held.
    pub(crate) fn release(&mut self) {
        if let Some(file) = self.file.take() {
            debug!("Releasing artifact #{} ({})", self.id, self.location.display());
            // Deletion failure leaves a stray temp file; nothing to recover.
            let _ = file.close();
        }
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// A claimed artifact, detached from the task. The temporary file is removed
/// when this value is dropped.
#[derive(Debug)]
pub struct ClaimedArtifact {
    suggested_filename: String,
    file: NamedTempFile,
}

impl ClaimedArtifact {
    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    /// Read the artifact bytes, consuming the claim.
    pub async fn into_bytes(self) -> Result<Vec<u8>, TypeShiftError> {
        let path = self.file.path().to_path_buf();
        tokio::fs::read(&path)
            .await
            .map_err(|e| TypeShiftError::ArtifactIo { path, source: e })
    }

    /// Copy the artifact to `dest`, consuming the claim.
    ///
    /// When `dest` is an existing directory, or ends with a path separator,
    /// the suggested filename is appended. Returns the final path written.
    pub async fn save_to(self, dest: impl AsRef<Path>) -> Result<PathBuf, TypeShiftError> {
        let dest = dest.as_ref();
        let names_dir = dest.to_string_lossy().ends_with(std::path::is_separator);
        let target = if names_dir
            || tokio::fs::metadata(dest)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
        {
            dest.join(&self.suggested_filename)
        } else {
            dest.to_path_buf()
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TypeShiftError::ArtifactIo {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        // Copy rather than rename: the temp dir may be on another filesystem.
        tokio::fs::copy(self.file.path(), &target)
            .await
            .map_err(|e| TypeShiftError::ArtifactIo {
                path: target.clone(),
                source: e,
            })?;

        debug!("Artifact saved to {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_writes_bytes_and_describes() {
        let handle = ArtifactHandle::create(7, "converted_a.docx".into(), b"hello").unwrap();
        let info = handle.describe();
        assert_eq!(info.id, 7);
        assert_eq!(info.size_bytes, 5);
        assert!(!info.consumed);
        assert!(info.location.exists());
        assert_eq!(info.location.extension().and_then(|e| e.to_str()), Some("docx"));
        assert_eq!(std::fs::read(&info.location).unwrap(), b"hello");
    }

    #[test]
    fn release_deletes_file() {
        let mut handle = ArtifactHandle::create(1, "converted_a.csv".into(), b"x,y").unwrap();
        let location = handle.describe().location;
        handle.release();
        assert!(!handle.is_live());
        assert!(!location.exists());
    }

    #[test]
    fn drop_deletes_file() {
        let handle = ArtifactHandle::create(1, "converted_a.csv".into(), b"x,y").unwrap();
        let location = handle.describe().location;
        drop(handle);
        assert!(!location.exists());
    }

    #[tokio::test]
    async fn claim_is_single_use() {
        let mut handle = ArtifactHandle::create(2, "converted_b.pdf".into(), b"%PDF").unwrap();
        let claimed = handle.claim().unwrap();
        assert!(handle.describe().consumed);
        assert!(matches!(
            handle.claim(),
            Err(TypeShiftError::ArtifactConsumed { .. })
        ));
        assert_eq!(claimed.into_bytes().await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn save_into_directory_uses_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = ArtifactHandle::create(3, "converted_photo.jpg".into(), b"jpeg").unwrap();
        let written = handle.claim().unwrap().save_to(dir.path()).await.unwrap();
        assert_eq!(written, dir.path().join("converted_photo.jpg"));
        assert_eq!(std::fs::read(&written).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn save_to_explicit_path_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out/nested/result.xlsx");
        let mut handle = ArtifactHandle::create(4, "converted_r.xlsx".into(), b"xl").unwrap();
        let written = handle.claim().unwrap().save_to(&dest).await.unwrap();
        assert_eq!(written, dest);
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn trailing_separator_names_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dest = format!("{}/fresh/", dir.path().display());
        let mut handle = ArtifactHandle::create(5, "converted_t.pdf".into(), b"pdf").unwrap();
        let written = handle.claim().unwrap().save_to(&dest).await.unwrap();
        assert_eq!(written, dir.path().join("fresh").join("converted_t.pdf"));
        assert!(written.exists());
    }
}
