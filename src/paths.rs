//! Path resolution for wsaudit
//!
//! # Environment Variables
//!
//! - `WSAUDIT_CONFIG_DIR` - Override config directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `WSAUDIT_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/wsaudit` (if set)
//! 3. `~/.config/wsaudit`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "WSAUDIT_CONFIG_DIR";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Subdirectory of the output directory that holds raw JSON dumps
pub const RAW_DATA_DIR: &str = "raw_data";

/// Get the wsaudit config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("wsaudit");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("wsaudit");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Path of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Raw dump directory under an output directory
pub fn raw_data_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(RAW_DATA_DIR)
}

/// File-system safe stem for a principal: `@` becomes `_`.
pub fn principal_stem(email: &str) -> String {
    email.replace('@', "_")
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set, restoring the previous value afterwards.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/wsaudit", || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/wsaudit"));
            assert_eq!(
                config_file().unwrap(),
                PathBuf::from("/custom/wsaudit/config.toml")
            );
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/keys/sa.json"), home.join("keys").join("sa.json"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/etc/sa.json"), PathBuf::from("/etc/sa.json"));
    }

    #[test]
    fn test_principal_stem() {
        assert_eq!(principal_stem("ana@example.com"), "ana_example.com");
        assert_eq!(principal_stem("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_raw_data_dir() {
        assert_eq!(
            raw_data_dir(Path::new("/out")),
            PathBuf::from("/out/raw_data")
        );
    }
}
