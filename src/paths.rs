//! Centralized path resolution for restsync
//!
//! # Environment Variables
//!
//! - `RESTSYNC_MANIFEST` - Manifest file to load
//! - `RESTSYNC_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/restsync`)
//!
//! # Manifest Resolution Priority
//!
//! 1. `--manifest` flag
//! 2. `RESTSYNC_MANIFEST` environment variable
//! 3. `manifest.toml` in the config directory
//!
//! For config_dir():
//! 1. `RESTSYNC_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/restsync` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\restsync`
//!    - macOS/Linux: `~/.config/restsync`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the manifest file
pub const ENV_MANIFEST: &str = "RESTSYNC_MANIFEST";

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "RESTSYNC_CONFIG_DIR";

/// Manifest file name inside the config directory
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Get the restsync config directory path
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
        let path = PathBuf::from(xdg_config).join("restsync");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("restsync");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("restsync");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Resolve the manifest to load
///
/// `explicit` is the `--manifest` flag, which wins over everything else.
pub fn manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(&path.to_string_lossy()));
    }

    if let Ok(file) = std::env::var(ENV_MANIFEST) {
        let path = expand(&file);
        log::debug!("Using manifest from {}: {}", ENV_MANIFEST, path.display());
        return Ok(path);
    }

    Ok(config_dir()?.join(MANIFEST_FILE))
}

/// Expand ~ and environment variables in a path string.
///
/// # Examples
///
/// ```ignore
/// let home_path = paths::expand("~/dotfiles/restsync.toml");
/// let var_path = paths::expand("$HOME/restsync.toml");
/// ```
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests below mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Helper to run a test with temporary env vars set (`Some`) or removed (`None`)
    fn with_env<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let originals: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| ((*key).to_string(), env::var(key).ok()))
            .collect();

        for (key, value) in vars {
            match value {
                // SAFETY: env access is serialized by ENV_LOCK
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }
        let result = f();
        for (key, original) in originals {
            match original {
                // SAFETY: env access is serialized by ENV_LOCK
                Some(v) => unsafe { env::set_var(&key, v) },
                None => unsafe { env::remove_var(&key) },
            }
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env(&[(ENV_CONFIG_DIR, Some("/custom/config/path"))], || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        with_env(&[(ENV_CONFIG_DIR, Some("~/dotfiles/restsync"))], || {
            assert_eq!(config_dir().unwrap(), home.join("dotfiles").join("restsync"));
        });
    }

    #[test]
    fn test_xdg_config_home() {
        with_env(
            &[
                (ENV_CONFIG_DIR, None),
                ("XDG_CONFIG_HOME", Some("/tmp/xdg-config-test")),
            ],
            || {
                assert_eq!(
                    config_dir().unwrap(),
                    PathBuf::from("/tmp/xdg-config-test/restsync")
                );
            },
        );
    }

    #[test]
    fn test_manifest_flag_wins() {
        with_env(&[(ENV_MANIFEST, Some("/from/env.toml"))], || {
            let path = manifest_path(Some(Path::new("/from/flag.toml"))).unwrap();
            assert_eq!(path, PathBuf::from("/from/flag.toml"));
        });
    }

    #[test]
    fn test_manifest_env_over_config_dir() {
        with_env(
            &[
                (ENV_MANIFEST, Some("/from/env.toml")),
                (ENV_CONFIG_DIR, Some("/config")),
            ],
            || {
                assert_eq!(manifest_path(None).unwrap(), PathBuf::from("/from/env.toml"));
            },
        );
    }

    #[test]
    fn test_manifest_defaults_to_config_dir() {
        with_env(
            &[(ENV_MANIFEST, None), (ENV_CONFIG_DIR, Some("/config"))],
            || {
                assert_eq!(
                    manifest_path(None).unwrap(),
                    PathBuf::from("/config/manifest.toml")
                );
            },
        );
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }
}
