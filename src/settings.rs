use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CardbatchError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub input_dir: String,
    pub output_dir: String,
    /// Overrides the platform downloads folder as the receipt holding area.
    #[serde(default)]
    pub downloads_dir: Option<String>,
    #[serde(default = "default_company_code")]
    pub company_code: String,
    #[serde(default = "default_vendor_account")]
    pub vendor_account: String,
    #[serde(default = "default_gl_fallback_ba")]
    pub gl_fallback_ba: String,
    #[serde(default = "default_due_date_offset_days")]
    pub due_date_offset_days: i64,
    #[serde(default = "default_recency_window_minutes")]
    pub recency_window_minutes: u64,
}

fn default_company_code() -> String {
    "BLM".to_string()
}

fn default_vendor_account() -> String {
    "AMEX".to_string()
}

fn default_gl_fallback_ba() -> String {
    "4470".to_string()
}

fn default_due_date_offset_days() -> i64 {
    8
}

fn default_recency_window_minutes() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        let base = default_data_dir();
        Self {
            input_dir: base.join("input").to_string_lossy().to_string(),
            output_dir: base.join("output").to_string_lossy().to_string(),
            downloads_dir: None,
            company_code: default_company_code(),
            vendor_account: default_vendor_account(),
            gl_fallback_ba: default_gl_fallback_ba(),
            due_date_offset_days: default_due_date_offset_days(),
            recency_window_minutes: default_recency_window_minutes(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("cardbatch")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("cardbatch")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CardbatchError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// The holding area where the human saves receipt downloads. Settings win;
/// otherwise probe the usual platform locations the way browsers save files.
pub fn downloads_dir(settings: &Settings) -> PathBuf {
    if let Some(dir) = &settings.downloads_dir {
        return PathBuf::from(dir);
    }
    if let Some(dir) = dirs::download_dir() {
        if dir.exists() {
            return dir;
        }
    }
    let probes = [
        dirs::home_dir().map(|h| h.join("Downloads")),
        dirs::home_dir().map(|h| h.join("Desktop")),
    ];
    for candidate in probes.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from(".")
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            input_dir: "/tmp/in".to_string(),
            output_dir: "/tmp/out".to_string(),
            downloads_dir: Some("/tmp/dl".to_string()),
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.input_dir, "/tmp/in");
        assert_eq!(loaded.downloads_dir.as_deref(), Some("/tmp/dl"));
        assert_eq!(loaded.company_code, "BLM");
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.vendor_account, "AMEX");
        assert_eq!(s.gl_fallback_ba, "4470");
        assert_eq!(s.due_date_offset_days, 8);
        assert_eq!(s.recency_window_minutes, 30);
        assert!(s.downloads_dir.is_none());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"input_dir": "/tmp/in", "output_dir": "/tmp/out"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.company_code, "BLM");
        assert_eq!(s.gl_fallback_ba, "4470");
        assert_eq!(s.recency_window_minutes, 30);
    }

    #[test]
    fn test_downloads_dir_prefers_setting() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            downloads_dir: Some(dir.path().to_string_lossy().to_string()),
            ..Settings::default()
        };
        assert_eq!(downloads_dir(&settings), dir.path());
    }
}
