use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) if val.trim().is_empty() => None,
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Origin of the bundled web client during local development.
pub const DEV_ORIGIN: &str = "http://localhost:5173";

/// Parse `ALLOWED_ORIGINS`: comma-separated origins, merged with [`DEV_ORIGIN`].
fn parse_allowed_origins() -> Vec<String> {
    let mut origins = vec![DEV_ORIGIN.to_string()];
    if let Ok(val) = env::var("ALLOWED_ORIGINS") {
        for origin in val.split(',') {
            let origin = origin.trim().trim_end_matches('/');
            if origin.is_empty() {
                continue;
            }
            if !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }
    }
    origins
}

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub cloud: CloudOcrConfig,
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Upper bound for a single uploaded image.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("LEGIBLE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or("LEGIBLE_PORT", 8000),
            allowed_origins: parse_allowed_origins(),
            max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
        }
    }
}

/// How the neural engine groups recognized lines into spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    Paragraph,
    Line,
}

impl FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paragraph" | "paragraphs" => Ok(Self::Paragraph),
            "line" | "lines" => Ok(Self::Line),
            other => Err(format!("unknown grouping mode '{other}'")),
        }
    }
}

/// Local recognition engines.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language pair, `+`-separated.
    pub languages: String,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    pub neural_model_dir: PathBuf,
    pub grouping: GroupingMode,
    /// Spans scoring below this are discarded before merging. Unset keeps all.
    pub min_confidence: Option<f32>,
    /// Longest side of the image handed to the local engines.
    pub recognition_max_dimension: u32,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "spa+eng".to_string()),
            neural_model_dir: env::var("OCR_NEURAL_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_dir()),
            grouping: parse_env_or("OCR_GROUPING", GroupingMode::Paragraph),
            min_confidence: parse_env_opt::<f32>("OCR_MIN_CONFIDENCE")
                .map(|c| c.clamp(0.0, 1.0)),
            recognition_max_dimension: parse_env_or("OCR_RECOGNITION_MAX_DIMENSION", 1280),
            timeout_secs: parse_env_or("OCR_TIMEOUT", 120),
        }
    }
}

/// OCR.Space cloud engine.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudOcrConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Language sent when the caller gives none or an unsupported one.
    pub default_language: String,
    pub timeout_secs: u64,
    pub max_payload_bytes: usize,
    pub max_dimension: u32,
    /// OCR.Space engine number (1, 2 or 3).
    pub engine: u8,
    /// Treat an empty remote result as "no text detected".
    pub require_text: bool,
}

impl Default for CloudOcrConfig {
    fn default() -> Self {
        Self {
            api_key: parse_env_opt("OCR_SPACE_API_KEY"),
            base_url: env::var("OCR_SPACE_URL")
                .unwrap_or_else(|_| "https://api.ocr.space/parse/image".to_string()),
            default_language: env::var("OCR_SPACE_LANGUAGE").unwrap_or_else(|_| "spa".to_string()),
            timeout_secs: parse_env_or("OCR_SPACE_TIMEOUT", 60),
            max_payload_bytes: parse_env_or("OCR_SPACE_MAX_PAYLOAD", 1_500_000),
            max_dimension: parse_env_or("OCR_SPACE_MAX_DIMENSION", 1280),
            engine: parse_env_or("OCR_SPACE_ENGINE", 2),
            require_text: parse_env_or("OCR_SPACE_REQUIRE_TEXT", true),
        }
    }
}

/// Tunables of the preprocessing pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreprocessConfig {
    pub upscale_factor: u32,
    /// Side of the square neighbourhood used by the adaptive threshold. Odd.
    pub adaptive_window: u32,
    pub adaptive_offset: i32,
    /// Minimum horizontal run treated as a ruled line.
    pub line_min_length: u32,
    pub clahe_clip_limit: f32,
    pub clahe_tiles: u32,
}

impl PreprocessConfig {
    fn sanitized(mut self) -> Self {
        self.upscale_factor = self.upscale_factor.clamp(1, 4);
        self.adaptive_window = self.adaptive_window.max(3) | 1;
        self.line_min_length = self.line_min_length.max(2);
        self.clahe_clip_limit = self.clahe_clip_limit.max(1.0);
        self.clahe_tiles = self.clahe_tiles.clamp(1, 64);
        self
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale_factor: parse_env_or("PREPROCESS_UPSCALE", 2),
            adaptive_window: parse_env_or("PREPROCESS_ADAPTIVE_WINDOW", 15),
            adaptive_offset: parse_env_or("PREPROCESS_ADAPTIVE_OFFSET", 11),
            line_min_length: parse_env_or("PREPROCESS_LINE_LENGTH", 40),
            clahe_clip_limit: parse_env_or("PREPROCESS_CLAHE_CLIP", 3.0),
            clahe_tiles: parse_env_or("PREPROCESS_CLAHE_TILES", 8),
        }
        .sanitized()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ocr: OcrConfig::default(),
            cloud: CloudOcrConfig::default(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "ALLOWED_ORIGINS",
        "OCR_GROUPING",
        "OCR_MIN_CONFIDENCE",
        "OCR_SPACE_API_KEY",
        "OCR_SPACE_LANGUAGE",
        "PREPROCESS_ADAPTIVE_WINDOW",
        "PREPROCESS_UPSCALE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = Config::default();
        assert_eq!(config.ocr.languages, "spa+eng");
        assert_eq!(config.ocr.grouping, GroupingMode::Paragraph);
        assert!(config.ocr.min_confidence.is_none());
        assert_eq!(config.ocr.recognition_max_dimension, 1280);
        assert!(config.cloud.api_key.is_none());
        assert_eq!(config.cloud.default_language, "spa");
        assert_eq!(config.cloud.max_payload_bytes, 1_500_000);
        assert_eq!(config.cloud.timeout_secs, 60);
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.server.allowed_origins, vec![DEV_ORIGIN.to_string()]);

        let pre = config.preprocess;
        assert_eq!(pre.upscale_factor, 2);
        assert_eq!(pre.adaptive_window, 15);
        assert_eq!(pre.adaptive_offset, 11);
        assert_eq!(pre.line_min_length, 40);
        assert_eq!(pre.clahe_tiles, 8);
    }

    #[test]
    #[serial]
    fn test_allowed_origins_are_merged_and_deduplicated() {
        clear_env();
        env::set_var(
            "ALLOWED_ORIGINS",
            "https://notes.example.com/, http://localhost:5173,,https://notes.example.com",
        );

        let origins = ServerConfig::default().allowed_origins;
        assert_eq!(
            origins,
            vec![
                DEV_ORIGIN.to_string(),
                "https://notes.example.com".to_string()
            ]
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back_to_defaults() {
        clear_env();
        env::set_var("OCR_GROUPING", "sideways");
        env::set_var("OCR_MIN_CONFIDENCE", "not-a-number");
        env::set_var("PREPROCESS_UPSCALE", "-3");

        let config = Config::default();
        assert_eq!(config.ocr.grouping, GroupingMode::Paragraph);
        assert!(config.ocr.min_confidence.is_none());
        assert_eq!(config.preprocess.upscale_factor, 2);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("OCR_GROUPING", "line");
        env::set_var("OCR_MIN_CONFIDENCE", "1.7");
        env::set_var("OCR_SPACE_API_KEY", "k-123");
        env::set_var("PREPROCESS_ADAPTIVE_WINDOW", "20");

        let config = Config::default();
        assert_eq!(config.ocr.grouping, GroupingMode::Line);
        assert_eq!(config.ocr.min_confidence, Some(1.0));
        assert_eq!(config.cloud.api_key.as_deref(), Some("k-123"));
        // Even windows are bumped to the next odd size.
        assert_eq!(config.preprocess.adaptive_window, 21);

        clear_env();
    }

    #[test]
    fn test_grouping_mode_parse() {
        assert_eq!("Paragraph".parse::<GroupingMode>(), Ok(GroupingMode::Paragraph));
        assert_eq!("lines".parse::<GroupingMode>(), Ok(GroupingMode::Line));
        assert!("columns".parse::<GroupingMode>().is_err());
    }
}
