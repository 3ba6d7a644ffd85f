use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the scratch directory for per-run diagnostics: `<exe_dir>/cache/`
///
/// Every invocation overwrites the files it writes here.
pub fn get_cache_dir() -> PathBuf {
    get_exe_dir().join("cache")
}

/// Returns the data directory: `<exe_dir>/data/`
pub fn get_data_dir() -> PathBuf {
    get_exe_dir().join("data")
}

/// Returns the full-screen snapshot directory: `<exe_dir>/data/snaps/`
pub fn get_snaps_dir() -> PathBuf {
    get_data_dir().join("snaps")
}

/// Returns the inventory CSV path: `<exe_dir>/data/inventory.csv`
pub fn get_inventory_csv() -> PathBuf {
    get_data_dir().join("inventory.csv")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_cache_dir())?;
    std::fs::create_dir_all(get_snaps_dir())?;
    Ok(())
}
