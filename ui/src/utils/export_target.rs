//! Picks where an export is written.
//!
//! A configured download directory wins; otherwise the user is asked through
//! a native save dialog. The trait lets tests avoid system dialogs.

use std::path::Path;

use qrstudio_business::{DirectorySink, DownloadSink, ExportArtifact, ExportFormat, PathSink};

pub trait ExportTarget {
    /// `None` when the user dismissed the dialog.
    fn sink_for(
        &self,
        format: ExportFormat,
        artifact: &ExportArtifact,
        download_dir: Option<&Path>,
    ) -> Option<Box<dyn DownloadSink>>;
}

/// Download directory if configured, native save dialog otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExportTarget;

impl ExportTarget for SystemExportTarget {
    fn sink_for(
        &self,
        format: ExportFormat,
        artifact: &ExportArtifact,
        download_dir: Option<&Path>,
    ) -> Option<Box<dyn DownloadSink>> {
        if let Some(dir) = download_dir {
            return Some(Box::new(DirectorySink::new(dir)));
        }

        let path = save_dialog(format, &artifact.file_name)?;
        Some(Box::new(PathSink::new(path)))
    }
}

/// Opens a native save dialog pre-filled with `file_name`.
pub fn save_dialog(format: ExportFormat, file_name: &str) -> Option<std::path::PathBuf> {
    let (label, extension) = match format {
        ExportFormat::Png => ("PNG image", "png"),
        ExportFormat::Svg => ("SVG image", "svg"),
    };

    let path = rfd::FileDialog::new()
        .set_title("Save QR code")
        .set_file_name(file_name)
        .add_filter(label, &[extension])
        .save_file()?;

    log::info!("User chose export path: {:?}", path);
    Some(path)
}
