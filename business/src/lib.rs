//! QR Studio business layer: input state, the debounced generation
//! pipeline, and export.

mod config;
mod encoder;
mod export;
mod generation;
mod input;
mod test_utils;

use std::sync::Arc;

use qrstudio_states::StateCtx;

pub use config::{DEFAULT_DEBOUNCE_MS, StudioConfig};
pub use encoder::{
    EncodingError, MARGIN_MODULES, QrCodeEncoder, QrEncoder, QrEncoderState, RenderOptions,
    parse_hex_color,
};
pub use export::{
    DirectorySink, DownloadSink, ExportArtifact, ExportError, ExportFormat, PathSink,
    ScopedTempFile, export, export_file_name, export_png, export_svg, now_millis,
};
pub use generation::{
    GENERIC_FAILURE, GenerateQrCommand, GenerationResult, GenerationStatus, QrGenerationCompute,
    generate,
};
pub use input::{
    DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, DEFAULT_SIZE, GenerationRequest, MAX_SIZE, MIN_SIZE,
    Preset, QrInput, SIZE_STEP, clamp_size,
};

/// Register every state, compute and command of the generator.
pub fn register(ctx: &mut StateCtx, config: StudioConfig, encoder: Arc<dyn QrEncoder>) {
    ctx.add_state(config);
    ctx.add_state(QrInput::default());
    ctx.add_state(QrEncoderState::new(encoder));
    ctx.record_compute(QrGenerationCompute::default());
    ctx.record_command(GenerateQrCommand);
    ctx.trigger_on::<QrInput, GenerateQrCommand>();
}
