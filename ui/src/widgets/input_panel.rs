//! Text, color, size and preset controls.
//!
//! Edits go to a copy of [`QrInput`]; the copy is written back through
//! `StateCtx::update` only when something changed, so an idle frame never
//! restarts the debounce.

use egui::{Response, Slider, TextEdit, Ui};
use qrstudio_business::{MAX_SIZE, MIN_SIZE, Preset, QrInput, SIZE_STEP, parse_hex_color};
use qrstudio_states::StateCtx;

const TEXT_HINT: &str = "https://example.com";
const COLOR_HINT: &str = "#RRGGBB";
const HEX_FIELD_WIDTH: f32 = 72.0;

pub fn input_panel(state_ctx: &mut StateCtx, ui: &mut Ui) -> Response {
    let current = state_ctx.state::<QrInput>();
    let active_preset = current.active_preset();
    let mut draft = current.clone();

    let response = ui
        .vertical(|ui| {
            ui.heading("QR Studio");
            ui.add_space(12.0);

            let text_label = ui.label("Text or URL");
            ui.add(
                TextEdit::multiline(&mut draft.text)
                    .hint_text(TEXT_HINT)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            )
            .labelled_by(text_label.id);

            ui.add_space(12.0);
            color_row(ui, "Foreground", &mut draft.foreground);
            color_row(ui, "Background", &mut draft.background);

            ui.add_space(12.0);
            let mut size = draft.size();
            ui.add(
                Slider::new(&mut size, MIN_SIZE..=MAX_SIZE)
                    .step_by(f64::from(SIZE_STEP))
                    .suffix(" px")
                    .text("Size"),
            );
            draft.set_size(size);

            ui.add_space(12.0);
            ui.label("Presets");
            ui.horizontal_wrapped(|ui| {
                for preset in Preset::ALL {
                    if ui
                        .selectable_label(active_preset == Some(preset), preset.label())
                        .clicked()
                    {
                        draft.apply_preset(preset);
                    }
                }
            });
        })
        .response;

    if draft != *state_ctx.state::<QrInput>() {
        state_ctx.update::<QrInput>(|input| *input = draft);
    }

    response
}

/// Color picker plus a hex field editing the same value.
fn color_row(ui: &mut Ui, label: &str, value: &mut String) {
    ui.horizontal(|ui| {
        let label = ui.label(label);

        // An unparsable hex keeps the picker black until the field is fixed.
        let mut rgb = parse_hex_color(value).unwrap_or_default();
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            let [r, g, b] = rgb;
            *value = format!("#{r:02x}{g:02x}{b:02x}");
        }

        ui.add(
            TextEdit::singleline(value)
                .hint_text(COLOR_HINT)
                .char_limit(COLOR_HINT.len())
                .desired_width(HEX_FIELD_WIDTH),
        )
        .labelled_by(label.id);
    });
}
