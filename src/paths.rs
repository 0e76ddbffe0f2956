//! Data directory resolution for portable and installed modes.
//!
//! The data directory holds the sender settings files, the optional
//! `engine.yaml` and the `logs/` directory.
//!
//! ## Mode Detection
//!
//! - **Override**: `--data-dir` wins over everything else.
//! - **Portable mode**: If a `.portable` marker file exists next to the
//!   executable, data lives in the executable's directory. This requires the
//!   directory to be writable.
//! - **Installed mode** (default): Data is stored in `<data dir>/OSC Deck`
//!   (`%APPDATA%` on Windows, `~/.local/share` on Linux).

use std::path::{Path, PathBuf};

/// Application name used for directories in installed mode
const APP_NAME: &str = "OSC Deck";

/// Marker file that selects portable mode
const PORTABLE_MARKER: &str = ".portable";

/// Application paths for settings and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding the settings files
    pub data_dir: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Whether running in portable mode (data next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Paths rooted at `data_dir`
    pub fn at(data_dir: PathBuf, is_portable: bool) -> Self {
        Self {
            logs_dir: data_dir.join("logs"),
            data_dir,
            is_portable,
        }
    }

    /// Detect the appropriate paths based on environment.
    ///
    /// Note: This is called before logging is initialized, so we use eprintln
    /// for early diagnostic output.
    pub fn detect(data_dir_override: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir_override {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Using data directory override: {}", dir.display());
            return Self::at(dir, true);
        }

        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        eprintln!("[paths] Executable directory: {}", exe_dir.display());

        Self::resolve(&exe_dir, dirs::data_dir())
    }

    fn resolve(exe_dir: &Path, platform_data_dir: Option<PathBuf>) -> Self {
        if exe_dir.join(PORTABLE_MARKER).exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::at(exe_dir.to_path_buf(), true);
        }

        let app_data = platform_data_dir
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: dirs::data_dir() returned None, falling back to exe dir");
                exe_dir.to_path_buf()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] Running in INSTALLED mode (data dir: {})", app_data.display());

        Self::at(app_data, false)
    }

    /// Ensure the data and logs directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.logs_dir)
    }
}
