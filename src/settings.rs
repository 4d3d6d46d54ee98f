//! Durable watermarks persisted as a single version-prefixed,
//! comma-separated line.

use std::path::{Path, PathBuf};

use tracing::warn;

const CURRENT_VERSION: u32 = 1;

/// `last_full_update`, `last_delta_update`, `last_delta_delete`: ms since
/// epoch. Zeroed fields force a full update on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub last_full_update: i64,
    pub last_delta_update: i64,
    pub last_delta_delete: i64,
}

impl Settings {
    fn to_line(self) -> String {
        format!(
            "{},{},{},{}",
            CURRENT_VERSION, self.last_delta_update, self.last_delta_delete, self.last_full_update
        )
    }

    fn from_line(line: &str) -> Option<(u32, Settings)> {
        let mut parts = line.trim().split(',');
        let version: u32 = parts.next()?.parse().ok()?;
        let last_delta_update = parts.next()?.parse().ok()?;
        let last_delta_delete = parts.next()?.parse().ok()?;
        let last_full_update = parts.next()?.parse().ok()?;
        Some((
            version,
            Settings {
                last_full_update,
                last_delta_update,
                last_delta_delete,
            },
        ))
    }
}

/// File-backed handle for the watermark file. Reads/writes a single UTF-8
/// file at `path`.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsStore { path: path.into() }
    }

    /// On parse or I/O failure, returns default-zeroed `Settings` and logs —
    /// never fatal (§4.1, §7 `settings_io_error`).
    pub fn load(&self) -> Settings {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "failed to read settings file");
                }
                return Settings::default();
            }
        };

        match Settings::from_line(&contents) {
            Some((version, settings)) => {
                if version != CURRENT_VERSION {
                    warn!(
                        path = %self.path.display(),
                        found = version,
                        expected = CURRENT_VERSION,
                        "settings file has an unrecognized version, accepting it anyway"
                    );
                }
                settings
            }
            None => {
                warn!(path = %self.path.display(), "failed to parse settings file, degrading to zero watermarks");
                Settings::default()
            }
        }
    }

    /// Overwrite the file atomically: write to a temp file in the same
    /// directory, rename over the target, fsync the parent directory. Logs
    /// and continues on failure; the caller must not treat this as fatal.
    pub fn persist(&self, settings: Settings) {
        if let Err(e) = persist_atomic(&self.path, &settings.to_line()) {
            warn!(path = %self.path.display(), error = %e, "failed to persist settings file");
        }
    }
}

fn persist_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    if let Ok(parent_dir) = std::fs::File::open(dir) {
        let _ = parent_dir.sync_all();
    }
    Ok(())
}
