//! Process-wide database location.
//!
//! # Responsibility
//! - Hold the single storage path used by `RepositoryScope::acquire_configured`.
//!
//! # Invariants
//! - The path is fixed once per process; switching to a different path is
//!   rejected.
//! - When never configured explicitly, the path resolves once from
//!   `KSIAZKA_DB_PATH`, falling back to a file in the temp directory.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable consulted when no path was configured explicitly.
pub const DB_PATH_ENV: &str = "KSIAZKA_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "ksiazka.sqlite3";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Fixes the database path for this process.
///
/// # Errors
/// - Returns an error when `path` is empty or not valid UTF-8.
/// - Returns an error when a different path is already active.
pub fn configure_db_path(path: impl AsRef<Path>) -> Result<(), String> {
    let requested = normalize_db_path(path.as_ref())?;
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active != requested {
        return Err(format!(
            "database path already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        ));
    }
    Ok(())
}

/// Returns the active database path, resolving the default on first use.
pub fn db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            std::env::var(DB_PATH_ENV)
                .ok()
                .and_then(|raw| normalize_db_path(Path::new(&raw)).ok())
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
        })
        .clone()
}

fn normalize_db_path(path: &Path) -> Result<PathBuf, String> {
    let raw = path
        .to_str()
        .ok_or_else(|| format!("database path `{}` is not valid UTF-8", path.display()))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("database path cannot be empty".to_string());
    }
    Ok(PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::{configure_db_path, db_path, normalize_db_path};
    use std::path::Path;

    #[test]
    fn normalize_db_path_rejects_blank_values() {
        let err = normalize_db_path(Path::new("   ")).expect_err("blank path must be rejected");
        assert!(err.contains("empty"));
    }

    #[test]
    fn normalize_db_path_trims_whitespace() {
        let path = normalize_db_path(Path::new(" data/ksiazka.db ")).unwrap();
        assert_eq!(path, Path::new("data/ksiazka.db"));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_db_path_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"db\xff.sqlite3"));
        let err = normalize_db_path(path).expect_err("non UTF-8 path must be rejected");
        assert!(err.contains("UTF-8"));
    }

    #[test]
    fn configure_is_idempotent_and_rejects_switching() {
        let first = std::env::temp_dir().join("ksiazka-config-test.sqlite3");
        configure_db_path(&first).expect("first configuration should succeed");
        configure_db_path(&first).expect("same path should be idempotent");
        assert_eq!(db_path(), first);

        let err = configure_db_path("other.sqlite3").expect_err("switching must fail");
        assert!(err.contains("refusing to switch"));
    }
}
