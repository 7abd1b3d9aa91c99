// Application settings
// Loaded from ~/.config/accession/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default image ordering for new projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortPreference {
    /// Newest filename first
    #[default]
    Descending,
    Ascending,
}

/// Vision-model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Base URL of the vision API
    pub endpoint: String,

    /// Environment variable holding the API key.
    /// Keys never live in this file.
    pub api_key_env: String,

    /// Model identifier, empty = server default
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            api_key_env: "ACCESSION_API_KEY".to_string(),
            model: String::new(),
        }
    }
}

impl AiSettings {
    /// Read the API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Persistence
    #[serde(rename = "save.debounceMs")]
    pub autosave_delay_ms: u64,

    // Project
    #[serde(rename = "project.sortOrder")]
    pub sort_order: SortPreference,

    // Grid rendering
    #[serde(rename = "grid.rowHeight")]
    pub row_height: f64,

    #[serde(rename = "grid.overscanRows")]
    pub overscan_rows: usize,

    // AI
    #[serde(rename = "ai", default)]
    pub ai: AiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Persistence
            autosave_delay_ms: 500,
            // Project
            sort_order: SortPreference::Descending,
            // Grid
            row_height: 24.0,
            overscan_rows: 5,
            // AI
            ai: AiSettings::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("accession");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file();
            return settings;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        eprintln!("Error parsing settings.json: {}", e);
                        eprintln!("Using default settings");
                        Self::default()
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(&path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(&self) {
        let path = Self::config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Persistence: debounce window for autosave, in milliseconds
    "save.debounceMs": 500,

    // Project: image ordering for new projects ("descending" or "ascending")
    "project.sortOrder": "descending",

    // Grid rendering
    "grid.rowHeight": 24,
    "grid.overscanRows": 5,

    // Vision model
    // The API key is read from the environment variable named by api_key_env,
    // never from this file
    "ai": {
        "endpoint": "http://localhost:8000",
        "api_key_env": "ACCESSION_API_KEY",
        "model": ""
    }
}
"#;

        if let Err(e) = fs::write(&path, default_config) {
            eprintln!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
