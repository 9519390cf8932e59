//! Preview of the current render.
//!
//! [`PreviewSurface`] owns the texture. It re-uploads only when a newer
//! successful attempt arrives, keeps the last image while the next one is
//! being generated, and drops it when the input goes blank or fails.

use egui::{ColorImage, Context, Response, TextureHandle, TextureOptions, Ui};
use qrstudio_business::{GenerationStatus, QrGenerationCompute};

use crate::utils::colors::{COLOR_AMBER, COLOR_RED};

pub const EMPTY_HINT: &str = "Enter text or a URL to generate a QR code";

#[derive(Default)]
pub struct PreviewSurface {
    texture: Option<TextureHandle>,
    /// Attempt the texture was uploaded from.
    sequence: u64,
}

impl std::fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("sequence", &self.sequence)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl PreviewSurface {
    pub fn sync(&mut self, ctx: &Context, compute: &QrGenerationCompute) {
        match compute.status() {
            GenerationStatus::Succeeded(result) => {
                if self.texture.is_some() && self.sequence == compute.sequence {
                    return;
                }

                let (width, height) = result.raster.dimensions();
                let image = ColorImage::from_rgba_unmultiplied(
                    [width as usize, height as usize],
                    result.raster.as_raw(),
                );
                if let Some(texture) = self.texture.as_mut() {
                    texture.set(image, TextureOptions::NEAREST);
                } else {
                    self.texture = Some(ctx.load_texture("qr_preview", image, TextureOptions::NEAREST));
                }
                self.sequence = compute.sequence;
                log::debug!("Preview updated to attempt {} ({width}px)", self.sequence);
            }
            GenerationStatus::Generating => {}
            GenerationStatus::Idle | GenerationStatus::Failed(_) => {
                self.texture = None;
            }
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }

    /// Pixel size of the current texture.
    pub fn size(&self) -> Option<[usize; 2]> {
        self.texture.as_ref().map(TextureHandle::size)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

pub fn preview(compute: &QrGenerationCompute, surface: &PreviewSurface, ui: &mut Ui) -> Response {
    ui.vertical_centered(|ui| {
        ui.add_space(12.0);
        match compute.status() {
            GenerationStatus::Idle => {
                ui.label(EMPTY_HINT);
            }
            GenerationStatus::Failed(message) => {
                ui.colored_label(COLOR_RED, message);
            }
            GenerationStatus::Generating | GenerationStatus::Succeeded(_) => {
                if let Some(texture) = surface.texture() {
                    let [width, _] = texture.size();
                    let side = (width as f32).min(ui.available_width());
                    ui.image((texture.id(), egui::vec2(side, side)));
                }
                if compute.is_generating() {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.colored_label(COLOR_AMBER, "Generating...");
                    });
                }
            }
        }
    })
    .response
}
