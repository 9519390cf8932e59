mod export_buttons;
mod input_panel;
mod preview;

pub use export_buttons::{ExportNotice, export_buttons, export_notice};
pub use input_panel::input_panel;
pub use preview::{EMPTY_HINT, PreviewSurface, preview};
