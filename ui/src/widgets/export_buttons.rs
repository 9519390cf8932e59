use std::path::PathBuf;

use egui::{Button, Ui};
use qrstudio_business::{ExportFormat, QrGenerationCompute};

use crate::utils::colors::{COLOR_GREEN, COLOR_RED};

/// Result of the last export, shown until the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportNotice {
    Saved(PathBuf),
    Failed(String),
}

/// Download buttons, enabled only once an attempt succeeded.
///
/// Returns the format the user asked for this frame.
pub fn export_buttons(compute: &QrGenerationCompute, ui: &mut Ui) -> Option<ExportFormat> {
    let enabled = compute.result().is_some();
    let mut requested = None;

    ui.horizontal(|ui| {
        if ui
            .add_enabled(enabled, Button::new("Download PNG"))
            .clicked()
        {
            requested = Some(ExportFormat::Png);
        }
        if ui
            .add_enabled(enabled, Button::new("Download SVG"))
            .clicked()
        {
            requested = Some(ExportFormat::Svg);
        }
    });

    requested
}

pub fn export_notice(notice: Option<&ExportNotice>, ui: &mut Ui) {
    match notice {
        Some(ExportNotice::Saved(path)) => {
            ui.colored_label(COLOR_GREEN, format!("Saved {}", path.display()));
        }
        Some(ExportNotice::Failed(err)) => {
            ui.colored_label(COLOR_RED, format!("Export failed: {err}"));
        }
        None => {}
    }
}
