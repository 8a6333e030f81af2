//! Configuration loading and resolution.
//!
//! Every setting resolves the same way: explicit flag, then environment
//! variable, then a built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKEND_URL_ENV: &str = "DYI_BACKEND_URL";
pub const BACKEND_TIMEOUT_ENV: &str = "DYI_BACKEND_TIMEOUT_SECS";
pub const CHROMIUM_PATH_ENV: &str = "DYI_CHROMIUM_PATH";

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/analyze";

/// The backend downloads and unpacks the whole archive before answering.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 300;

/// Resolve the analysis backend endpoint.
pub fn resolve_backend_url(explicit: Option<&str>) -> String {
    backend_url_from(explicit, std::env::var(BACKEND_URL_ENV).ok())
}

fn backend_url_from(explicit: Option<&str>, env: Option<String>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }
    match env {
        Some(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => DEFAULT_BACKEND_URL.to_string(),
    }
}

/// Resolve how long to wait for the analysis backend.
pub fn resolve_backend_timeout(explicit_secs: Option<u64>) -> Duration {
    backend_timeout_from(explicit_secs, std::env::var(BACKEND_TIMEOUT_ENV).ok())
}

fn backend_timeout_from(explicit_secs: Option<u64>, env: Option<String>) -> Duration {
    let secs = explicit_secs
        .or_else(|| {
            env.and_then(|v| match v.trim().parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    tracing::warn!("Ignoring invalid {BACKEND_TIMEOUT_ENV}={v}");
                    None
                }
            })
        })
        .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
    Duration::from_secs(secs.max(1))
}

/// Per-user directory holding the browser profile and an optional bundled Chromium.
pub const APP_DIR: &str = ".dyi-capture";

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Directory for the browser profile, so a login survives between runs.
pub fn resolve_profile_dir() -> PathBuf {
    app_dir().join("profile")
}

/// Find the Chromium binary: `DYI_CHROMIUM_PATH`, then a copy under
/// `~/.dyi-capture/chromium/`, then `PATH`, then the usual install location.
pub fn find_chromium() -> Option<PathBuf> {
    if let Some(found) = chromium_from(std::env::var(CHROMIUM_PATH_ENV).ok(), &app_dir()) {
        return Some(found);
    }

    if let Some(found) = ["google-chrome", "chromium", "chromium-browser"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
    {
        return Some(found);
    }

    if cfg!(target_os = "macos") {
        let common = Path::new("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common.to_path_buf());
        }
    }

    None
}

/// The explicit override if it exists, else the first bundled binary under `app_dir`.
fn chromium_from(explicit: Option<String>, app_dir: &Path) -> Option<PathBuf> {
    if let Some(p) = explicit {
        let path = PathBuf::from(p.trim());
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("{CHROMIUM_PATH_ENV} points at a missing file: {}", path.display());
    }

    bundled_chromium_candidates(&app_dir.join("chromium"))
        .into_iter()
        .find(|c| c.exists())
}

fn bundled_chromium_candidates(root: &Path) -> Vec<PathBuf> {
    const TESTING_APP: &str =
        "Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing";
    if cfg!(target_os = "macos") {
        vec![
            root.join("chrome-mac-arm64").join(TESTING_APP),
            root.join("chrome-mac-x64").join(TESTING_APP),
            root.join(TESTING_APP),
            root.join("chrome"),
        ]
    } else {
        vec![root.join("chrome-linux64/chrome"), root.join("chrome")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_precedence() {
        assert_eq!(
            backend_url_from(Some("http://flag/analyze"), Some("http://env/analyze".into())),
            "http://flag/analyze"
        );
        assert_eq!(
            backend_url_from(None, Some(" http://env/analyze ".into())),
            "http://env/analyze"
        );
        assert_eq!(backend_url_from(None, Some("".into())), DEFAULT_BACKEND_URL);
        assert_eq!(backend_url_from(None, None), DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_backend_timeout_precedence() {
        assert_eq!(
            backend_timeout_from(Some(10), Some("20".into())),
            Duration::from_secs(10)
        );
        assert_eq!(
            backend_timeout_from(None, Some("20".into())),
            Duration::from_secs(20)
        );
        assert_eq!(
            backend_timeout_from(None, Some("soon".into())),
            Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS)
        );
        assert_eq!(backend_timeout_from(Some(0), None), Duration::from_secs(1));
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dyi-capture-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_chromium_override_wins_when_present() {
        let dir = scratch_dir("override");
        let binary = dir.join("my-chrome");
        std::fs::write(&binary, b"").unwrap();

        let found = chromium_from(Some(binary.display().to_string()), &dir);
        assert_eq!(found, Some(binary));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_override_falls_back_to_bundled() {
        let dir = scratch_dir("bundled");
        let bundled = dir.join("chromium/chrome");
        std::fs::create_dir_all(bundled.parent().unwrap()).unwrap();
        std::fs::write(&bundled, b"").unwrap();

        let found = chromium_from(Some(dir.join("nope").display().to_string()), &dir);
        assert_eq!(found, Some(bundled));
        assert_eq!(chromium_from(None, &dir.join("empty")), None);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_profile_dir_is_under_app_dir() {
        assert!(resolve_profile_dir().ends_with(".dyi-capture/profile"));
    }
}
