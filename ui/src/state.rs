use std::sync::Arc;

use qrstudio_business::{QrCodeEncoder, QrEncoder, StudioConfig, register};
use qrstudio_states::StateCtx;

use crate::widgets::{ExportNotice, PreviewSurface};

/// The main application state.
pub struct State {
    /// The state context for business logic.
    pub ctx: StateCtx,
    /// Texture of the last successful render.
    pub preview: PreviewSurface,
    /// Outcome of the last export, shown under the download buttons.
    pub notice: Option<ExportNotice>,
}

impl Default for State {
    fn default() -> Self {
        Self::new(StudioConfig::from_env(), Arc::new(QrCodeEncoder))
    }
}

impl State {
    pub fn new(config: StudioConfig, encoder: Arc<dyn QrEncoder>) -> Self {
        let mut ctx = StateCtx::new();
        register(&mut ctx, config, encoder);

        Self {
            ctx,
            preview: PreviewSurface::default(),
            notice: None,
        }
    }

    /// State with the real encoder and a fixed config, ignoring the environment.
    pub fn test(config: StudioConfig) -> Self {
        Self::new(config, Arc::new(QrCodeEncoder))
    }
}
