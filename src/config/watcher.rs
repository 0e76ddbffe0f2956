//! Sender settings watcher for hot-reload support
//!
//! Watches the data directory and re-reads the sender settings whenever one
//! of the three settings files changes, so edits made outside the engine
//! restart the OSC sender.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{SenderSettings, SENDER_FILES};

/// Debounce before re-reading, lets writers finish
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watcher that sends freshly loaded sender settings on change
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<SenderSettings>,
}

impl SettingsWatcher {
    /// Load the current sender settings and start watching `data_dir`
    pub async fn new(data_dir: PathBuf) -> Result<(Self, SenderSettings)> {
        let (tx, rx) = mpsc::channel(10);

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let initial = SenderSettings::load(&data_dir)
            .await
            .context("Failed to load initial sender settings")?;

        // notify callbacks run on their own OS thread, not in Tokio context
        let runtime_handle = tokio::runtime::Handle::current();
        let dir = data_dir.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !is_settings_change(&event) {
                        return;
                    }
                    debug!("Sender settings changed: {:?}", event.paths);

                    let dir = dir.clone();
                    let tx = tx.clone();
                    runtime_handle.spawn(async move {
                        tokio::time::sleep(RELOAD_DEBOUNCE).await;

                        match SenderSettings::load(&dir).await {
                            Ok(settings) => {
                                if let Err(e) = tx.send(settings).await {
                                    error!("Failed to send settings update: {}", e);
                                }
                            },
                            Err(e) => {
                                warn!("Failed to reload sender settings (keeping old ones): {}", e);
                            },
                        }
                    });
                },
                Err(e) => {
                    error!("Watch error: {}", e);
                },
            }
        })?;

        watcher
            .watch(Path::new(&data_dir), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch data directory: {}", data_dir.display()))?;

        info!("Settings watcher started for: {}", data_dir.display());

        Ok((
            Self {
                _watcher: watcher,
                rx,
            },
            initial,
        ))
    }

    /// Wait for the next settings update
    /// Returns None if the watcher has been closed
    pub async fn next_settings(&mut self) -> Option<SenderSettings> {
        self.rx.recv().await
    }
}

fn is_settings_change(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| SENDER_FILES.contains(&name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_only_settings_files_trigger_reload() {
        let event = |name: &str| {
            Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
                .add_path(PathBuf::from("/data").join(name))
        };

        assert!(is_settings_change(&event("sender_ip")));
        assert!(is_settings_change(&event("sender_port")));
        assert!(is_settings_change(&event("listener_port")));
        assert!(!is_settings_change(&event("engine.yaml")));
        assert!(!is_settings_change(
            &Event::new(EventKind::Remove(notify::event::RemoveKind::Any))
                .add_path(PathBuf::from("/data/sender_ip"))
        ));
    }

    #[tokio::test]
    async fn test_settings_watcher_basic() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("sender_ip"), "127.0.0.1\n")?;
        fs::write(temp_dir.path().join("sender_port"), "9000\n")?;

        let (mut watcher, initial) = SettingsWatcher::new(temp_dir.path().to_path_buf()).await?;
        assert_eq!(initial.sender_port, 9000);

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(temp_dir.path().join("sender_port"), "9100\n")?;

        // Wait for reload (with timeout)
        let updated = tokio::time::timeout(Duration::from_secs(2), watcher.next_settings()).await?;

        if let Some(updated) = updated {
            assert_eq!(updated.sender_ip, "127.0.0.1");
            assert_eq!(updated.sender_port, 9100);
        }

        Ok(())
    }
}
