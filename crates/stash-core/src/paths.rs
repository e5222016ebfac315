//! Data-directory resolution.
//!
//! The store server is pointed at a dedicated on-disk data directory.
//! If the preferred location cannot be created (read-only install,
//! permission error), we fall back to a directory under the user's home.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Preferred data directory: `./db` relative to the working directory.
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("db")
}

/// Ensure `preferred` exists, falling back to `~/{fallback_name}` if it
/// cannot be created. Returns the directory that is actually usable.
pub fn ensure_dir(preferred: &Path, fallback_name: &str) -> std::io::Result<PathBuf> {
    match std::fs::create_dir_all(preferred) {
        Ok(()) => {
            info!(path = %preferred.display(), "data directory ready");
            Ok(preferred.to_path_buf())
        }
        Err(e) => {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            let fallback = home.join(fallback_name);
            warn!(
                preferred = %preferred.display(),
                fallback = %fallback.display(),
                error = %e,
                "falling back to home data directory"
            );
            std::fs::create_dir_all(&fallback)?;
            Ok(fallback)
        }
    }
}
