use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, DubError};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base address of the dubbing service
    pub base_url: String,
    /// Resource path of the dub endpoint, appended to the base address
    pub dub_path: String,
    /// Multipart field name the video file is attached under
    pub file_field: String,
    /// Query parameter carrying the target language
    pub language_param: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Language preselected when none is given
    pub default_language: String,
    /// Reject a submission while another one is still in flight
    #[serde(default)]
    pub block_concurrent_submissions: bool,
    /// Languages offered by the language selector
    pub languages: Vec<LanguageOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageOption {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory holding local references to dubbed media
    pub media_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the log file
    pub dir: PathBuf,
    /// Log file name; rotated files get a date suffix
    pub file_name: String,
    /// How often the log file rolls over
    pub rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".dubclient/log"),
            file_name: "dubclient.log".to_string(),
            rotation: LogRotation::Daily,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            dub_path: "/dub/".to_string(),
            file_field: "file".to_string(),
            language_param: "target_lang".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        let languages = [
            ("en", "English"),
            ("hi", "Hindi"),
            ("gu", "Gujarati"),
            ("pa", "Punjabi"),
            ("bn", "Bengali"),
            ("ta", "Tamil"),
            ("te", "Telugu"),
            ("ml", "Malayalam"),
            ("kn", "Kannada"),
            ("mr", "Marathi"),
            ("ur", "Urdu"),
            ("es", "Spanish"),
            ("fr", "French"),
        ]
        .into_iter()
        .map(|(code, label)| LanguageOption {
            code: code.to_string(),
            label: label.to_string(),
        })
        .collect();

        Self {
            default_language: "hi".to_string(),
            block_concurrent_submissions: false,
            languages,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from(".dubclient/media"),
        }
    }
}

impl UiConfig {
    /// Look up a language in the selector menu
    pub fn find_language(&self, code: &str) -> Option<&LanguageOption> {
        self.languages.iter().find(|l| l.code == code)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DubError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| DubError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.backend.base_url).map_err(|e| {
            DubError::Config(format!("Invalid backend base_url '{}': {}", self.backend.base_url, e))
        })?;

        if self.backend.file_field.is_empty() {
            return Err(DubError::Config("backend.file_field must not be empty".to_string()));
        }
        if self.backend.language_param.is_empty() {
            return Err(DubError::Config("backend.language_param must not be empty".to_string()));
        }
        if self.logging.file_name.trim().is_empty() {
            return Err(DubError::Config("logging.file_name must not be empty".to_string()));
        }
        if self.ui.default_language.trim().is_empty() {
            return Err(DubError::Config("ui.default_language must not be empty".to_string()));
        }

        Ok(())
    }
}
