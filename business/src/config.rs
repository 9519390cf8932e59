use std::any::Any;
use std::env::vars;
use std::path::{Path, PathBuf};
use std::time::Duration;

use qrstudio_states::State;
use serde::Deserialize;

/// Quiet period before an input change is encoded.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Deserialize)]
struct RawConfig {
    qrstudio_debounce_ms: Option<u64>,
    qrstudio_download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    debounce_ms: u64,
    /// When set, exports land here directly instead of asking for a location.
    download_dir: Option<PathBuf>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            download_dir: None,
        }
    }
}

impl StudioConfig {
    pub fn new(debounce_ms: u64, download_dir: Option<PathBuf>) -> Self {
        Self {
            debounce_ms,
            download_dir,
        }
    }

    /// Reads `QRSTUDIO_DEBOUNCE_MS` and `QRSTUDIO_DOWNLOAD_DIR`.
    pub fn from_env() -> Self {
        Self::from_vars(vars())
    }

    /// Same as [`StudioConfig::from_env`] over an explicit variable list.
    /// Values that fail to parse fall back to the defaults.
    pub fn from_vars<S: AsRef<str>>(vars: impl IntoIterator<Item = (S, S)>) -> Self {
        let raw: Result<RawConfig, _> = serde_env::from_iter(vars);
        match raw {
            Ok(raw) => Self {
                debounce_ms: raw.qrstudio_debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
                download_dir: raw.qrstudio_download_dir.filter(|dir| !dir.as_os_str().is_empty()),
            },
            Err(err) => {
                log::warn!("Invalid QR Studio configuration, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn download_dir(&self) -> Option<&Path> {
        self.download_dir.as_deref()
    }
}

impl State for StudioConfig {
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
