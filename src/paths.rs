//! Path helpers for user-supplied directories.

use std::path::{Path, PathBuf};

/// Expands a leading `~` in a path to the user's home directory.
///
/// This handles the common case where shell tilde expansion doesn't occur,
/// such as `--output=~/meshes` or a value read from `MESHBATCH_OUTPUT`.
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}

/// Expand `~` and make the path absolute against the current directory.
///
/// Does not touch the filesystem, so missing directories are reported later
/// by validation rather than here.
pub fn resolve_dir<P: AsRef<Path>>(path: P) -> PathBuf {
    let expanded = expand_tilde(path);
    std::path::absolute(&expanded).unwrap_or(expanded)
}
