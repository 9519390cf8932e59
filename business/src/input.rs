//! User-editable generator input.
//!
//! The UI writes these fields through `StateCtx::update::<QrInput>()`, which
//! re-enqueues [`crate::GenerateQrCommand`]. Nothing here validates colors;
//! the encoder rejects what it cannot parse.

use std::any::Any;

use qrstudio_states::State;

pub const MIN_SIZE: u32 = 128;
pub const MAX_SIZE: u32 = 512;
pub const SIZE_STEP: u32 = 32;
pub const DEFAULT_SIZE: u32 = 256;

pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Snap to the nearest [`SIZE_STEP`] and clamp to `[MIN_SIZE, MAX_SIZE]`.
pub fn clamp_size(size: u32) -> u32 {
    let steps = (size.clamp(MIN_SIZE, MAX_SIZE) - MIN_SIZE + SIZE_STEP / 2) / SIZE_STEP;
    (MIN_SIZE + steps * SIZE_STEP).min(MAX_SIZE)
}

/// One-click color pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Classic,
    Ocean,
    Forest,
    Grape,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Classic, Preset::Ocean, Preset::Forest, Preset::Grape];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Classic => "Classic",
            Preset::Ocean => "Ocean",
            Preset::Forest => "Forest",
            Preset::Grape => "Grape",
        }
    }

    /// `(foreground, background)` as hex strings.
    pub fn colors(self) -> (&'static str, &'static str) {
        match self {
            Preset::Classic => ("#000000", "#ffffff"),
            Preset::Ocean => ("#1e40af", "#dbeafe"),
            Preset::Forest => ("#166534", "#dcfce7"),
            Preset::Grape => ("#6b21a8", "#f3e8ff"),
        }
    }
}

/// Everything the encoder needs for one attempt, captured when the
/// debounce fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub foreground: String,
    pub background: String,
    pub size: u32,
}

impl GenerationRequest {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrInput {
    pub text: String,
    pub foreground: String,
    pub background: String,
    size: u32,
}

impl Default for QrInput {
    fn default() -> Self {
        Self {
            text: String::new(),
            foreground: DEFAULT_FOREGROUND.to_owned(),
            background: DEFAULT_BACKGROUND.to_owned(),
            size: DEFAULT_SIZE,
        }
    }
}

impl QrInput {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = clamp_size(size);
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let (foreground, background) = preset.colors();
        foreground.clone_into(&mut self.foreground);
        background.clone_into(&mut self.background);
    }

    /// The preset whose colors match the current ones, ignoring case.
    pub fn active_preset(&self) -> Option<Preset> {
        Preset::ALL.into_iter().find(|preset| {
            let (foreground, background) = preset.colors();
            self.foreground.eq_ignore_ascii_case(foreground)
                && self.background.eq_ignore_ascii_case(background)
        })
    }

    pub fn request(&self) -> GenerationRequest {
        GenerationRequest {
            text: self.text.clone(),
            foreground: self.foreground.clone(),
            background: self.background.clone(),
            size: self.size,
        }
    }
}

impl State for QrInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}
