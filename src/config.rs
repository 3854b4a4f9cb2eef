use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FmError, Result};
use crate::ui::panel::{parse_sort_by, parse_sort_order, parse_view_type, SortBy, SortOrder, ViewType};

pub const DEFAULT_DISK: &str = "local";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/file-manager";

fn default_disk() -> String {
    DEFAULT_DISK.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_active_panel() -> String {
    "left".to_string()
}

fn default_sort_by() -> String {
    "name".to_string()
}

fn default_sort_order() -> String {
    "asc".to_string()
}

fn default_view_type() -> String {
    "table".to_string()
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_text_extensions() -> Vec<String> {
    ["txt", "md", "json", "yml", "yaml", "toml", "ini", "cfg", "conf", "log", "sh", "xml"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_audio_extensions() -> Vec<String> {
    ["ogg", "mp3", "aac", "wav", "flac"].iter().map(|s| s.to_string()).collect()
}

fn default_video_extensions() -> Vec<String> {
    ["webm", "mp4", "mkv"].iter().map(|s| s.to_string()).collect()
}

/// Per-panel start-up preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default = "default_disk")]
    pub disk: String,
    /// Start directory; `None` opens the disk root
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_view_type")]
    pub view_type: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            disk: default_disk(),
            path: None,
            sort_by: default_sort_by(),
            sort_order: default_sort_order(),
            view_type: default_view_type(),
        }
    }
}

impl PanelSettings {
    pub fn sort(&self) -> (SortBy, SortOrder) {
        (parse_sort_by(&self.sort_by), parse_sort_order(&self.sort_order))
    }

    pub fn view(&self) -> ViewType {
        parse_view_type(&self.view_type)
    }
}

/// Coarse file category used to decide which viewer an entry opens with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Image,
    Text,
    Audio,
    Video,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the remote file-manager API (`/tree` and `/content` live below it)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Show dot files in panels and in the tree
    #[serde(default)]
    pub hidden_files: bool,
    #[serde(default = "default_active_panel")]
    pub active_panel: String,
    #[serde(default)]
    pub left_panel: PanelSettings,
    #[serde(default)]
    pub right_panel: PanelSettings,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout(),
            hidden_files: false,
            active_panel: default_active_panel(),
            left_panel: PanelSettings::default(),
            right_panel: PanelSettings::default(),
            image_extensions: default_image_extensions(),
            text_extensions: default_text_extensions(),
            audio_extensions: default_audio_extensions(),
            video_extensions: default_video_extensions(),
        }
    }
}

impl Settings {
    /// `~/.paneldir`
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".paneldir"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.json"))
    }

    /// Load from the default location, falling back to defaults when there is
    /// no home directory or no settings file yet.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| FmError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| FmError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| FmError::Config("cannot determine home directory".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FmError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| FmError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| FmError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn classify(&self, extension: &str) -> FileCategory {
        let ext = extension.to_lowercase();
        let has = |list: &[String]| list.iter().any(|e| e.eq_ignore_ascii_case(&ext));
        if has(&self.image_extensions) {
            FileCategory::Image
        } else if has(&self.text_extensions) {
            FileCategory::Text
        } else if has(&self.audio_extensions) {
            FileCategory::Audio
        } else if has(&self.video_extensions) {
            FileCategory::Video
        } else {
            FileCategory::Other
        }
    }
}
