//! PNG/SVG export of the last successful generation.
//!
//! Building an [`ExportArtifact`] is pure; delivering it goes through a
//! [`DownloadSink`]. Sinks write into a [`ScopedTempFile`] first and move it
//! into place, so a failed delivery never leaves a partial file behind.

use std::fs;
use std::io::{self, Cursor, Write as _};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::QrGenerationCompute;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),
}

impl ExportError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

/// `qrcode-<unix-ms>.<ext>`
pub fn export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("qrcode-{timestamp_ms}.{}", format.extension())
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `Ok(None)` unless the last attempt succeeded.
pub fn export_png(
    compute: &QrGenerationCompute,
    timestamp_ms: i64,
) -> Result<Option<ExportArtifact>, ExportError> {
    let Some(result) = compute.result() else {
        return Ok(None);
    };

    let mut bytes = Vec::new();
    result
        .raster
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    Ok(Some(ExportArtifact {
        file_name: export_file_name(ExportFormat::Png, timestamp_ms),
        media_type: ExportFormat::Png.media_type(),
        bytes,
    }))
}

/// `None` unless the last attempt succeeded.
pub fn export_svg(compute: &QrGenerationCompute, timestamp_ms: i64) -> Option<ExportArtifact> {
    let result = compute.result()?;

    Some(ExportArtifact {
        file_name: export_file_name(ExportFormat::Svg, timestamp_ms),
        media_type: ExportFormat::Svg.media_type(),
        bytes: result.svg.as_bytes().to_vec(),
    })
}

pub fn export(
    compute: &QrGenerationCompute,
    format: ExportFormat,
    timestamp_ms: i64,
) -> Result<Option<ExportArtifact>, ExportError> {
    match format {
        ExportFormat::Png => export_png(compute, timestamp_ms),
        ExportFormat::Svg => Ok(export_svg(compute, timestamp_ms)),
    }
}

/// A uniquely named temporary file next to its final destination.
///
/// Removed on drop unless [`ScopedTempFile::persist`] moved it into place.
#[derive(Debug)]
pub struct ScopedTempFile {
    file: NamedTempFile,
}

impl ScopedTempFile {
    /// Write `bytes` to a fresh `.qrcode-*.part` file in `target`'s directory.
    pub fn write(target: &Path, bytes: &[u8]) -> Result<Self, ExportError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = tempfile::Builder::new()
            .prefix(".qrcode-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|err| ExportError::io(dir, err))?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|err| ExportError::io(file.path(), err))?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn persist(self, target: &Path) -> Result<PathBuf, ExportError> {
        // On failure the returned file is dropped here, which removes it.
        self.file
            .persist(target)
            .map_err(|err| ExportError::io(target, err.error))?;
        Ok(target.to_path_buf())
    }
}

/// Where exported files go.
pub trait DownloadSink {
    /// Returns the path the artifact ended up at.
    fn deliver(&self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError>;
}

fn write_artifact(target: &Path, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
    let path = ScopedTempFile::write(target, &artifact.bytes)?.persist(target)?;
    log::info!(
        "Exported {} ({} bytes) to {}",
        artifact.media_type,
        artifact.bytes.len(),
        path.display()
    );
    Ok(path)
}

/// Writes artifacts under their own file name into a fixed directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|err| ExportError::io(&self.dir, err))?;
        write_artifact(&self.dir.join(&artifact.file_name), artifact)
    }
}

/// Writes to one exact path, e.g. the answer of a save dialog.
#[derive(Debug, Clone)]
pub struct PathSink {
    path: PathBuf,
}

impl PathSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DownloadSink for PathSink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<PathBuf, ExportError> {
        write_artifact(&self.path, artifact)
    }
}
