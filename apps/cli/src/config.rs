//! Uploader configuration.
//!
//! Stored as TOML, by default in `config.toml` next to the executable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use videoup_protocol::UploadSettings;
use videoup_protocol::constants::DEFAULT_API_BASE;
use videoup_transfer::MEGABYTE;
use videoup_uploader::RetryPolicy;
use videoup_vimeo::Timeouts;

pub const CONFIG_FILENAME: &str = "config.toml";

/// Uploader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder scanned for videos to upload.
    pub upload_folder_path: PathBuf,

    /// Where successfully uploaded files are moved. Left in place if unset.
    #[serde(default)]
    pub finished_folder_path: Option<PathBuf>,

    /// Folder holding the session store. Defaults to the upload folder.
    #[serde(default)]
    pub store_folder_path: Option<PathBuf>,

    /// Chunk size in decimal megabytes.
    #[serde(default = "default_chunk_size_mb")]
    pub chunk_size_mb: u64,

    /// File extensions picked up from the upload folder, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Description attached to every new video.
    #[serde(default)]
    pub description: String,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    pub vimeo: VimeoConfig,
}

/// Vimeo account and request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VimeoConfig {
    pub personal_access_token: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,

    #[serde(default = "default_cooldown")]
    pub rate_limit_cooldown_secs: u64,

    #[serde(default)]
    pub upload_settings: UploadSettings,
}

fn default_chunk_size_mb() -> u64 {
    100
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".into()]
}

fn default_log_level() -> String {
    "info".into()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.into()
}

fn default_metadata_timeout() -> u64 {
    30
}

fn default_transfer_timeout() -> u64 {
    900
}

fn default_cooldown() -> u64 {
    60
}

impl Config {
    /// Loads and validates the configuration at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.vimeo.personal_access_token.trim().is_empty() {
            bail!("vimeo.personal_access_token is empty");
        }
        if self.chunk_size_mb == 0 {
            bail!("chunk_size_mb must be at least 1");
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            bail!("extensions lists no file types");
        }
        if !self.upload_folder_path.is_dir() {
            bail!(
                "upload folder {} is not a directory",
                self.upload_folder_path.display()
            );
        }
        Ok(())
    }

    pub fn store_folder(&self) -> &Path {
        self.store_folder_path
            .as_deref()
            .unwrap_or(&self.upload_folder_path)
    }

    /// Chunk size in bytes.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size_mb * MEGABYTE
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            metadata: Duration::from_secs(self.vimeo.metadata_timeout_secs),
            transfer: Duration::from_secs(self.vimeo.transfer_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            cooldown: Duration::from_secs(self.vimeo.rate_limit_cooldown_secs),
            ..RetryPolicy::default()
        }
    }

    /// Returns `true` if `path` has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.'))
            .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext))
    }
}

/// `config.toml` beside the running executable.
pub fn default_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("locating executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn minimal(upload: &Path) -> String {
        format!(
            "upload_folder_path = {:?}\n\n[vimeo]\npersonal_access_token = \"abc\"\n",
            upload.display().to_string()
        )
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), &minimal(dir.path()));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.chunk_size(), 100 * MEGABYTE);
        assert_eq!(config.extensions, vec!["mp4".to_string()]);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.store_folder(), dir.path());
        assert!(config.finished_folder_path.is_none());
        assert_eq!(config.vimeo.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeouts(), Timeouts::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.vimeo.upload_settings, UploadSettings::default());
    }

    #[test]
    fn full_config_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            r#"upload_folder_path = {upload:?}
finished_folder_path = "/srv/done"
store_folder_path = "/srv/state"
chunk_size_mb = 25
extensions = ["mp4", "MOV"]
description = "Recorded lectures"
log_level = "debug"

[vimeo]
personal_access_token = "abc"
api_base = "http://localhost:9000"
metadata_timeout_secs = 5
transfer_timeout_secs = 60
rate_limit_cooldown_secs = 2

[vimeo.upload_settings]
content_rating = ["safe"]

[vimeo.upload_settings.privacy]
view = "anybody"
download = true
"#,
            upload = dir.path().display().to_string()
        );
        let path = write_config(dir.path(), &body);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.chunk_size(), 25 * MEGABYTE);
        assert_eq!(config.store_folder(), Path::new("/srv/state"));
        assert_eq!(
            config.finished_folder_path.as_deref(),
            Some(Path::new("/srv/done"))
        );
        assert_eq!(config.retry_policy().cooldown, Duration::from_secs(2));
        assert_eq!(config.timeouts().metadata, Duration::from_secs(5));

        let settings = &config.vimeo.upload_settings;
        assert_eq!(settings.content_rating, vec!["safe".to_string()]);
        assert_eq!(settings.privacy.view, "anybody");
        assert!(settings.privacy.download);
        assert_eq!(settings.privacy.comments, "nobody");
    }

    #[test]
    fn extension_match_ignores_case_and_dot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config: Config = toml::from_str(&minimal(dir.path())).unwrap();
        config.extensions = vec![".MP4".into(), "mov".into()];

        assert!(config.accepts(Path::new("a.mp4")));
        assert!(config.accepts(Path::new("b.MOV")));
        assert!(!config.accepts(Path::new("c.mkv")));
        assert!(!config.accepts(Path::new("noext")));
    }

    #[test]
    fn empty_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = minimal(dir.path()).replace("\"abc\"", "\"\"");
        let path = write_config(dir.path(), &body);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("chunk_size_mb = 0\n{}", minimal(dir.path()));
        let path = write_config(dir.path(), &body);
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn missing_upload_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), &minimal(&dir.path().join("nope")));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = Config::load(Path::new("/nonexistent/videoup.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/videoup.toml"));
    }
}
