use std::time::Duration;

use qrstudio_business::{ExportFormat, QrGenerationCompute, StudioConfig, export, now_millis};

use crate::state::State;
use crate::utils::export_target::{ExportTarget, SystemExportTarget};
use crate::widgets::{self, ExportNotice};

/// How often to poll while an attempt is still pending.
const PENDING_REPAINT: Duration = Duration::from_millis(50);

#[derive(bon::Builder)]
pub struct QrStudioApp {
    pub state: State,
    #[builder(default = Box::new(SystemExportTarget) as Box<dyn ExportTarget>)]
    export_target: Box<dyn ExportTarget>,
}

impl QrStudioApp {
    fn export(&mut self, format: ExportFormat) {
        let compute = self.state.ctx.compute::<QrGenerationCompute>();
        let artifact = match export(compute, format, now_millis()) {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                log::warn!("Export requested without a successful render");
                return;
            }
            Err(err) => {
                log::error!("Export failed: {err}");
                self.state.notice = Some(ExportNotice::Failed(err.to_string()));
                return;
            }
        };

        let download_dir = self.state.ctx.state::<StudioConfig>().download_dir();
        let Some(sink) = self.export_target.sink_for(format, &artifact, download_dir) else {
            log::info!("Export of {} cancelled", artifact.file_name);
            return;
        };

        self.state.notice = Some(match sink.deliver(&artifact) {
            Ok(path) => ExportNotice::Saved(path),
            Err(err) => {
                log::error!("Export failed: {err}");
                ExportNotice::Failed(err.to_string())
            }
        });
    }
}

impl eframe::App for QrStudioApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Sync Compute for render
        self.state.ctx.sync_computes();
        self.state
            .preview
            .sync(ctx, self.state.ctx.compute::<QrGenerationCompute>());

        egui::SidePanel::left("input_panel")
            .resizable(false)
            .min_width(260.0)
            .show(ctx, |ui| {
                widgets::input_panel(&mut self.state.ctx, ui);
            });

        let mut requested = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            let compute = self.state.ctx.compute::<QrGenerationCompute>();
            widgets::preview(compute, &self.state.preview, ui);
            ui.separator();
            requested = widgets::export_buttons(compute, ui);
            widgets::export_notice(self.state.notice.as_ref(), ui);
        });

        if let Some(format) = requested {
            self.export(format);
        }

        // Run background jobs
        self.state.ctx.flush_commands();
        if self.state.ctx.task_count() > 0 {
            ctx.request_repaint_after(PENDING_REPAINT);
        }
    }
}
