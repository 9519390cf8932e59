//! Test helpers for the generation pipeline.
//!
//! Tests run on a paused Tokio clock (`#[tokio::test(start_paused = true)]`),
//! so debounce delays elapse instantly once every task is waiting.
//!
//! ```ignore
//! let mut test_ctx = TestContext::new();
//! test_ctx.set_text("hello");
//! test_ctx.settle().await;
//! assert!(test_ctx.generation().result().is_some());
//! ```

#![cfg(test)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use qrstudio_states::StateCtx;

use crate::{
    EncodingError, QrCodeEncoder, QrEncoder, QrGenerationCompute, QrInput, RenderOptions,
    StudioConfig, register,
};

/// Real encoder that records what it was asked to encode.
///
/// Optionally sleeps before encoding one specific text, to force attempts
/// to overlap.
#[derive(Debug, Default)]
pub struct RecordingEncoder {
    delay_for: Option<(String, Duration)>,
    raster_calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl RecordingEncoder {
    pub fn with_delay(text: &str, delay: Duration) -> Self {
        Self {
            delay_for: Some((text.to_owned(), delay)),
            ..Self::default()
        }
    }

    pub fn raster_calls(&self) -> usize {
        self.raster_calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("texts lock").clone()
    }
}

#[async_trait]
impl QrEncoder for RecordingEncoder {
    async fn encode_raster(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<RgbaImage, EncodingError> {
        self.raster_calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().expect("texts lock").push(text.to_owned());

        if let Some((slow, delay)) = &self.delay_for
            && slow == text
        {
            tokio::time::sleep(*delay).await;
        }
        QrCodeEncoder::raster(text, options)
    }

    async fn encode_svg(
        &self,
        text: &str,
        options: &RenderOptions,
    ) -> Result<String, EncodingError> {
        QrCodeEncoder::svg(text, options)
    }
}

/// A fully registered `StateCtx` with a [`RecordingEncoder`].
pub struct TestContext {
    pub ctx: StateCtx,
    pub encoder: Arc<RecordingEncoder>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_encoder(Arc::new(RecordingEncoder::default()))
    }

    pub fn with_encoder(encoder: Arc<RecordingEncoder>) -> Self {
        let mut ctx = StateCtx::new();
        let shared: Arc<dyn QrEncoder> = encoder.clone();
        register(&mut ctx, StudioConfig::default(), shared);
        Self { ctx, encoder }
    }

    pub fn set_text(&mut self, text: &str) {
        self.ctx
            .update::<QrInput>(|input| text.clone_into(&mut input.text));
    }

    pub fn generation(&self) -> &QrGenerationCompute {
        self.ctx.compute::<QrGenerationCompute>()
    }

    /// Flush queued commands and wait until every spawned attempt finished,
    /// syncing after each one.
    pub async fn settle(&mut self) {
        self.ctx.sync_computes();
        self.ctx.flush_commands();

        let timeout = Duration::from_secs(5);
        let start = std::time::Instant::now();

        while self.ctx.task_count() > 0 {
            assert!(
                start.elapsed() < timeout,
                "Timed out waiting for {} task(s)",
                self.ctx.task_count()
            );
            if self.ctx.task_set_mut().join_next().await.is_some() {
                self.ctx.sync_computes();
            }
        }

        self.ctx.sync_computes();
    }
}
