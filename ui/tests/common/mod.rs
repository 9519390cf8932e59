use std::path::{Path, PathBuf};
use std::time::Duration;

use egui_kittest::Harness;
use qrstudio_business::{DEFAULT_DEBOUNCE_MS, QrGenerationCompute, QrInput, StudioConfig};
use qrstudio_ui::QrStudioApp;
use qrstudio_ui::state::State;
use tempfile::TempDir;

/// Virtual time between frames while waiting for an attempt.
const SETTLE_TICK: Duration = Duration::from_millis(50);
const MAX_SETTLE_ROUNDS: usize = 200;

/// Harness around the full app, exporting into a temporary directory.
///
/// Meant for `#[tokio::test(start_paused = true)]`, so the debounce costs no
/// wall-clock time.
pub struct TestCtx<'a> {
    download_dir: TempDir,
    harness: Harness<'a, QrStudioApp>,
}

impl<'a> TestCtx<'a> {
    pub fn new_app() -> Self {
        let download_dir = tempfile::tempdir().expect("tempdir");
        let config = StudioConfig::new(
            DEFAULT_DEBOUNCE_MS,
            Some(download_dir.path().to_path_buf()),
        );
        let app = QrStudioApp::builder().state(State::test(config)).build();
        let harness = Harness::new_eframe(|_| app);

        Self {
            download_dir,
            harness,
        }
    }

    pub fn harness_mut(&mut self) -> &mut Harness<'a, QrStudioApp> {
        &mut self.harness
    }

    #[allow(unused)]
    pub fn harness(&self) -> &Harness<'a, QrStudioApp> {
        &self.harness
    }

    /// Edit the input the way the text field would.
    pub fn set_text(&mut self, text: &str) {
        self.harness
            .state_mut()
            .state
            .ctx
            .update::<QrInput>(|input| text.clone_into(&mut input.text));
    }

    #[allow(unused)]
    pub fn input(&self) -> &QrInput {
        self.harness.state().state.ctx.state::<QrInput>()
    }

    pub fn generation(&self) -> &QrGenerationCompute {
        self.harness
            .state()
            .state
            .ctx
            .compute::<QrGenerationCompute>()
    }

    /// Step frames until no attempt is queued or running.
    pub async fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            self.harness.step();

            let ctx = &self.harness.state().state.ctx;
            if ctx.task_count() == 0 && !ctx.has_queued_commands() {
                self.harness.step();
                return;
            }
            tokio::time::sleep(SETTLE_TICK).await;
        }
        panic!("Generation did not settle");
    }

    /// Files written to the download directory, sorted.
    #[allow(unused)]
    pub fn downloads(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.download_dir.path())
            .expect("download dir")
            .map(|entry| entry.expect("dir entry").path())
            .collect();
        files.sort();
        files
    }

    #[allow(unused)]
    pub fn download_dir(&self) -> &Path {
        self.download_dir.path()
    }
}
