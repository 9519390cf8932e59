//! Debounced generation pipeline.
//
// Flow:
// - UI edits `QrInput` via `ctx.update`, which enqueues `GenerateQrCommand`
// - Each attempt waits out the debounce delay; a newer attempt cancels that wait
// - After the wait, the attempt encodes raster then SVG and reports through its
//   `LatestOnlyUpdater`, so an older attempt finishing late is dropped on sync
// - UI reads `ctx.cached::<QrGenerationCompute>()`

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use qrstudio_states::{
    Command, CommandFuture, CommandSnapshot, Compute, LatestOnlyUpdater, assign_impl,
};
use tokio_util::sync::CancellationToken;

use crate::{
    EncodingError, GenerationRequest, QrEncoder, QrEncoderState, QrInput, RenderOptions,
    StudioConfig,
};

/// Shown when an encoding error has no message of its own.
pub const GENERIC_FAILURE: &str = "Failed to generate QR code";

/// Output of one successful attempt.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub request: GenerationRequest,
    pub raster: RgbaImage,
    pub svg: String,
}

#[derive(Debug, Clone, Default)]
pub enum GenerationStatus {
    /// No text to encode.
    #[default]
    Idle,
    /// The debounce fired and the encoder is running.
    Generating,
    Succeeded(Arc<GenerationResult>),
    Failed(String),
}

/// Render/preview state, written only by [`GenerateQrCommand`].
#[derive(Debug, Clone, Default)]
pub struct QrGenerationCompute {
    pub status: GenerationStatus,
    /// Generation of the attempt that produced `status`.
    pub sequence: u64,
}

impl QrGenerationCompute {
    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.status, GenerationStatus::Idle)
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.status, GenerationStatus::Generating)
    }

    /// The last successful result, only while the status is `Succeeded`.
    pub fn result(&self) -> Option<&GenerationResult> {
        match &self.status {
            GenerationStatus::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            GenerationStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl Compute for QrGenerationCompute {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        assign_impl(self, new_self);
    }
}

/// Encode raster first, then SVG, with the same options.
pub async fn generate(
    encoder: &dyn QrEncoder,
    request: &GenerationRequest,
) -> Result<GenerationResult, EncodingError> {
    let options = RenderOptions::for_request(request);
    let raster = encoder.encode_raster(&request.text, &options).await?;
    let svg = encoder.encode_svg(&request.text, &options).await?;

    Ok(GenerationResult {
        request: request.clone(),
        raster,
        svg,
    })
}

fn failure_message(err: &EncodingError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_owned()
    } else {
        message
    }
}

struct Attempt {
    request: GenerationRequest,
    delay: Duration,
    encoder: Arc<dyn QrEncoder>,
}

impl Attempt {
    fn from_snapshot(snap: &CommandSnapshot) -> Result<Self, qrstudio_states::Error> {
        Ok(Self {
            request: snap.state::<QrInput>()?.request(),
            delay: snap.state::<StudioConfig>()?.debounce(),
            encoder: snap.state::<QrEncoderState>()?.encoder(),
        })
    }
}

/// Debounce gate plus encoder call.
///
/// Registered with `ctx.trigger_on::<QrInput, GenerateQrCommand>()`, so
/// every input change spawns a new attempt and cancels the previous wait.
#[derive(Default, Debug)]
pub struct GenerateQrCommand;

impl Command for GenerateQrCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let sequence = updater.generation();
        let attempt = match Attempt::from_snapshot(&snap) {
            Ok(attempt) => attempt,
            Err(err) => {
                log::error!("GenerateQrCommand: {err}");
                return Box::pin(async {});
            }
        };

        Box::pin(async move {
            let Attempt {
                request,
                delay,
                encoder,
            } = attempt;

            if request.is_blank() {
                updater.set(QrGenerationCompute {
                    status: GenerationStatus::Idle,
                    sequence,
                });
                return;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    log::debug!("Generation {sequence} superseded before the debounce fired");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            log::debug!(
                "Generation {sequence}: {} chars at {}px",
                request.text.chars().count(),
                request.size
            );
            updater.set(QrGenerationCompute {
                status: GenerationStatus::Generating,
                sequence,
            });

            let status = match generate(encoder.as_ref(), &request).await {
                Ok(result) => GenerationStatus::Succeeded(Arc::new(result)),
                Err(err) => {
                    log::warn!("Generation {sequence} failed: {err}");
                    GenerationStatus::Failed(failure_message(&err))
                }
            };
            updater.set(QrGenerationCompute { status, sequence });
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_utils::{RecordingEncoder, TestContext};

    // Past the 3391-character alphanumeric capacity of level M.
    const LONG_TEXT_LEN: usize = 4000;

    #[tokio::test(start_paused = true)]
    async fn generates_after_debounce() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("https://example.com");
        test_ctx.settle().await;

        let compute = test_ctx.generation();
        let result = compute.result().expect("succeeded");
        assert_eq!(result.raster.dimensions(), (256, 256));
        assert_eq!(result.request.text, "https://example.com");
        assert!(result.svg.contains(r#"width="256""#));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_debounce_delay() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("hello");
        test_ctx.ctx.flush_commands();

        tokio::time::sleep(Duration::from_millis(299)).await;
        test_ctx.ctx.sync_computes();
        assert!(test_ctx.generation().is_idle());
        assert_eq!(test_ctx.encoder.raster_calls(), 0);

        test_ctx.settle().await;
        assert!(test_ctx.generation().result().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_encode_once_with_final_text() {
        let mut test_ctx = TestContext::new();

        for text in ["a", "ab", "abc"] {
            test_ctx.set_text(text);
            test_ctx.ctx.flush_commands();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        test_ctx.settle().await;

        assert_eq!(test_ctx.encoder.raster_calls(), 1);
        assert_eq!(test_ctx.encoder.texts(), vec!["abc".to_owned()]);
        let result = test_ctx.generation().result().expect("succeeded");
        assert_eq!(result.request.text, "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_is_idle_without_encoding() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("   \n ");
        test_ctx.settle().await;

        assert!(test_ctx.generation().is_idle());
        assert_eq!(test_ctx.encoder.raster_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_text_drops_previous_result() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("hello");
        test_ctx.settle().await;
        assert!(test_ctx.generation().result().is_some());

        test_ctx.set_text("");
        test_ctx.ctx.flush_commands();
        // No debounce on the blank path.
        tokio::task::yield_now().await;
        test_ctx.settle().await;

        let compute = test_ctx.generation();
        assert!(compute.is_idle());
        assert!(compute.result().is_none());
        assert!(compute.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_text_fails_without_result() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("hello");
        test_ctx.settle().await;

        test_ctx.set_text(&"A".repeat(LONG_TEXT_LEN));
        test_ctx.settle().await;

        let compute = test_ctx.generation();
        let message = compute.error().expect("failed");
        assert!(!message.is_empty());
        assert!(compute.result().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_after_failure_is_idle() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text(&"A".repeat(LONG_TEXT_LEN));
        test_ctx.settle().await;
        assert!(test_ctx.generation().error().is_some());

        test_ctx.set_text("  ");
        test_ctx.settle().await;

        let compute = test_ctx.generation();
        assert!(compute.is_idle());
        assert!(compute.error().is_none());
        assert!(compute.result().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn size_too_small_for_payload_fails() {
        let mut test_ctx = TestContext::new();
        test_ctx.ctx.update::<QrInput>(|input| {
            input.text = "a".repeat(1800);
            input.set_size(128);
        });
        test_ctx.settle().await;

        let compute = test_ctx.generation();
        let message = compute.error().expect("failed");
        assert!(message.contains("larger size"), "message was {message:?}");
        assert!(compute.result().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_color_surfaces_as_failure() {
        let mut test_ctx = TestContext::new();
        test_ctx.ctx.update::<QrInput>(|input| {
            input.text = "hello".to_owned();
            input.foreground = "#12".to_owned();
        });
        test_ctx.settle().await;

        let message = test_ctx.generation().error().expect("failed").to_owned();
        assert!(message.contains("#12"), "message was {message:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn size_change_rerenders_at_new_size() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("hello");
        test_ctx.settle().await;

        test_ctx.ctx.update::<QrInput>(|input| input.set_size(384));
        test_ctx.settle().await;

        let result = test_ctx.generation().result().expect("succeeded");
        assert_eq!(result.raster.dimensions(), (384, 384));
        assert_eq!(result.request.text, "hello");
        assert_eq!(result.request.foreground, "#000000");
        assert_eq!(result.request.background, "#ffffff");
        assert_eq!(test_ctx.encoder.raster_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_older_attempt_does_not_overwrite_newer_result() {
        let encoder = Arc::new(RecordingEncoder::with_delay("slow", Duration::from_secs(1)));
        let mut test_ctx = TestContext::with_encoder(encoder);

        test_ctx.set_text("slow");
        test_ctx.ctx.flush_commands();
        // Past the debounce: the first attempt is now inside the encoder.
        tokio::time::sleep(Duration::from_millis(350)).await;

        test_ctx.set_text("fast");
        test_ctx.settle().await;

        assert_eq!(test_ctx.encoder.raster_calls(), 2);
        let result = test_ctx.generation().result().expect("succeeded");
        assert_eq!(result.request.text, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_debounce_never_encodes() {
        let mut test_ctx = TestContext::new();
        test_ctx.set_text("hello");
        test_ctx.ctx.flush_commands();

        test_ctx.ctx.shutdown().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        test_ctx.ctx.sync_computes();

        assert_eq!(test_ctx.encoder.raster_calls(), 0);
        assert!(test_ctx.generation().is_idle());
    }

    #[test]
    fn failure_message_falls_back_when_empty() {
        assert_eq!(
            failure_message(&EncodingError::Encode(String::new())),
            GENERIC_FAILURE
        );
        assert_eq!(
            failure_message(&EncodingError::Encode("boom".to_owned())),
            "boom"
        );
    }
}
