//! Shared color constants for the UI.

use egui::Color32;

/// Forest green for a completed export.
pub const COLOR_GREEN: Color32 = Color32::from_rgb(34, 139, 34);

/// Red for generation and export failures.
pub const COLOR_RED: Color32 = Color32::from_rgb(220, 53, 69);

/// Amber for an attempt still in progress.
pub const COLOR_AMBER: Color32 = Color32::from_rgb(255, 193, 7);
