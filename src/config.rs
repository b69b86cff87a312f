use std::path::PathBuf;

pub const APP_NAME: &str = "Claimlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default application data directory: ~/Claimlens/ on all platforms.
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Claimlens")
}

/// Everything the pipeline and its components need, resolved once at startup
/// and passed in explicitly. No ambient global configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Where uploaded originals are stored.
    pub upload_dir: PathBuf,
    /// Latest OCR snapshot per document id.
    pub ocr_snapshot_dir: PathBuf,
    /// Latest extraction snapshot per document id.
    pub extraction_snapshot_dir: PathBuf,
    /// Documents scoring below this require human review.
    pub confidence_threshold: f32,
    /// Credential for the external text-generation service. When absent the
    /// pipeline uses the regex fallback strategy and never calls out.
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let root = app_data_dir();
        Self {
            database_path: root.join("claimlens.db"),
            upload_dir: root.join("uploads"),
            ocr_snapshot_dir: root.join("ocr"),
            extraction_snapshot_dir: root.join("extractions"),
            confidence_threshold: 0.8,
            llm_api_key: None,
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the environment, falling back to defaults.
    /// Reads a `.env` file first when one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let default = Self::default();
        Self {
            database_path: path_var("DATABASE_PATH", default.database_path),
            upload_dir: path_var("UPLOAD_DIR", default.upload_dir),
            ocr_snapshot_dir: path_var("OCR_SNAPSHOT_DIR", default.ocr_snapshot_dir),
            extraction_snapshot_dir: path_var(
                "EXTRACTION_SNAPSHOT_DIR",
                default.extraction_snapshot_dir,
            ),
            confidence_threshold: std::env::var("CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.confidence_threshold),
            llm_api_key: std::env::var("LLM_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL")
                .unwrap_or(default.llm_api_base_url),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(default.llm_model),
        }
    }

    /// All storage under one root — handy for tests and embedded use.
    pub fn with_storage_root(root: &std::path::Path) -> Self {
        Self {
            database_path: root.join("claimlens.db"),
            upload_dir: root.join("uploads"),
            ocr_snapshot_dir: root.join("ocr"),
            extraction_snapshot_dir: root.join("extractions"),
            ..Self::default()
        }
    }
}

fn path_var(name: &str, default: PathBuf) -> PathBuf {
    std::env::var(name).map(PathBuf::from).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_point_eight() {
        let config = AppConfig::default();
        assert!((config.confidence_threshold - 0.8).abs() < f32::EPSILON);
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Claimlens"));
    }

    #[test]
    fn storage_root_groups_directories() {
        let root = std::path::Path::new("/tmp/claimlens-test");
        let config = AppConfig::with_storage_root(root);
        assert!(config.upload_dir.starts_with(root));
        assert!(config.ocr_snapshot_dir.starts_with(root));
        assert!(config.extraction_snapshot_dir.starts_with(root));
        assert!(config.database_path.starts_with(root));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
