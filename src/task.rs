//! Conversion task data model: the selected file, status, and the immutable
//! snapshot the controller publishes after every operation.

use crate::catalog::TargetFormatOption;
use crate::error::{TaskError, TypeShiftError};
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file chosen by the user: payload plus its original name.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    filename: String,
    payload: Bytes,
}

impl SelectedFile {
    pub fn new(filename: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            payload: payload.into(),
        }
    }

    /// Read a local file, keeping only its final path component as the name.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TypeShiftError> {
        let path = path.as_ref();
        let payload = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TypeShiftError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => TypeShiftError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => TypeShiftError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Loaded {} ({} bytes)", filename, payload.len());
        Ok(Self::new(filename, payload))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub(crate) fn info(&self) -> FileInfo {
        FileInfo {
            filename: self.filename.clone(),
            size_bytes: self.size(),
        }
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("filename", &self.filename)
            .field("size", &self.payload.len())
            .finish()
    }
}

/// Externally visible description of the selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub size_bytes: u64,
}

impl FileInfo {
    /// Size in KiB with one decimal, e.g. `"12.5 KB"`.
    pub fn display_size(&self) -> String {
        format!("{:.1} KB", self.size_bytes as f64 / 1024.0)
    }
}

/// Lifecycle state of a conversion task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No file selected.
    #[default]
    Idle,
    /// File selected and a target chosen; ready to convert.
    Ready,
    /// A conversion or simulation is outstanding.
    Converting,
    /// An artifact is available.
    Succeeded,
    /// The last conversion failed; see the task error.
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Ready => "ready",
            TaskStatus::Converting => "converting",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A converted (or simulated) result the view can offer for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadableArtifact {
    /// Handle id, unique per controller.
    pub id: u64,
    /// Temporary local file holding the bytes until retrieved or released.
    pub location: PathBuf,
    /// `converted_<stem>.<target>`.
    pub suggested_filename: String,
    pub size_bytes: u64,
    /// Set once the bytes have been retrieved; the handle is single-use.
    pub consumed: bool,
}

/// Immutable view of the task, published after every controller operation.
///
/// The default value is the initial `Idle` task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub selected_file: Option<FileInfo>,
    pub target_format: Option<TargetFormatOption>,
    pub candidates: Vec<TargetFormatOption>,
    pub artifact: Option<DownloadableArtifact>,
    pub error: Option<TaskError>,
    pub is_simulated: bool,
}

impl TaskSnapshot {
    /// The chosen target's format code, e.g. `"DOCX"`.
    pub fn target_code(&self) -> Option<&'static str> {
        self.target_format.map(|t| t.code)
    }

    pub fn is_converting(&self) -> bool {
        self.status == TaskStatus::Converting
    }

    /// Whether the view should offer the simulation fallback.
    pub fn offers_simulation(&self) -> bool {
        self.status == TaskStatus::Failed
            && self.error.as_ref().is_some_and(TaskError::offers_simulation)
    }
}

/// Stem used in download names: the original name up to its first `.`.
pub fn filename_stem(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}

/// `"converted_" + stem + "." + lowercase(target)`.
pub fn suggested_filename(original: &str, target_code: &str) -> String {
    format!(
        "converted_{}.{}",
        filename_stem(original),
        target_code.to_ascii_lowercase()
    )
}
