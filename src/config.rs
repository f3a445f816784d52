//! Component configuration loaded from TOML.

use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directory name created under the pictures root for compressed output.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "CompressedImages";

const CONFIG_FILE_NAME: &str = "image-compressor.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Initial state of the verbose log switch.
    #[serde(default)]
    pub log_enabled: bool,

    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,

    #[serde(default)]
    pub storage: StorageLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_enabled: false,
            output_dir_name: default_output_dir_name(),
            storage: StorageLayout::default(),
        }
    }
}

impl Config {
    /// Directory compressed images are written into.
    pub fn output_dir(&self) -> PathBuf {
        self.storage.pictures_dir.join(&self.output_dir_name)
    }
}

/// Platform directories the resolver and recompressor depend on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageLayout {
    /// Root of the primary shared storage volume.
    pub external_storage_root: PathBuf,

    /// App-specific cache directories on every mounted volume. Secondary
    /// volumes are recognised by their id appearing in one of these paths.
    pub external_cache_dirs: Vec<PathBuf>,

    /// Private cache directory receiving copies of cloud content.
    pub cache_dir: PathBuf,

    /// Public pictures directory.
    pub pictures_dir: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        let user_dirs = UserDirs::new();
        let home = user_dirs
            .as_ref()
            .map(|d| d.home_dir().to_path_buf())
            .unwrap_or_else(std::env::temp_dir);
        let pictures_dir = user_dirs
            .as_ref()
            .and_then(|d| d.picture_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| home.join("Pictures"));
        let cache_dir = project_dirs()
            .map(|d| d.cache_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("image-compressor"));

        Self {
            external_storage_root: home,
            external_cache_dirs: Vec::new(),
            cache_dir,
            pictures_dir,
        }
    }
}

fn default_output_dir_name() -> String {
    DEFAULT_OUTPUT_DIR_NAME.to_string()
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "image-compressor")
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let mut candidates = vec![PathBuf::from(".").join(CONFIG_FILE_NAME)];
    if let Some(dirs) = project_dirs() {
        candidates.push(dirs.config_dir().join("config.toml"));
    }

    for path in candidates {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            return load_config(&path);
        }
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            log_enabled = true
            output_dir_name = "Shrunk"

            [storage]
            external_storage_root = "/storage/emulated/0"
            external_cache_dirs = ["/storage/1234-ABCD/Android/data/app/cache"]
            cache_dir = "/data/user/0/app/cache"
            pictures_dir = "/storage/emulated/0/Pictures"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.log_enabled);
        assert_eq!(config.storage.external_cache_dirs.len(), 1);
        assert_eq!(
            config.output_dir(),
            PathBuf::from("/storage/emulated/0/Pictures/Shrunk")
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("[storage]\npictures_dir = \"/pics\"\n").unwrap();
        assert!(!config.log_enabled);
        assert_eq!(config.output_dir_name, DEFAULT_OUTPUT_DIR_NAME);
        assert_eq!(config.output_dir(), PathBuf::from("/pics/CompressedImages"));
        assert!(config.storage.external_cache_dirs.is_empty());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_enabled = true\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.log_enabled);
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_enabled = \"maybe\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_or_default(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
