use crate::error::{Result, UpdaterError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const LOCAL_CONFIG: &str = "./samba-updater.toml";

/// Represents the complete configuration for samba-updater.
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// working setup for the Samba library stack on the openSUSE build service.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Build-service login; discovered with `osc whois` when absent
    #[serde(default)]
    pub user: Option<String>,

    /// Address for changelog headers; falls back to the build-service account
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Packages in processing order
    #[serde(default = "default_packages")]
    pub packages: Vec<PackageConfig>,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_api_url() -> String {
    "https://api.opensuse.org".to_string()
}

fn default_packages() -> Vec<PackageConfig> {
    let mut packages: Vec<PackageConfig> = ["talloc", "tdb", "tevent", "ldb"]
        .iter()
        .map(|name| PackageConfig::new(*name, format!("lib/{}/wscript", name)))
        .collect();
    packages.push(PackageConfig::new("samba", "VERSION").with_listing_path("samba/stable"));
    packages
}

/// Where upstream releases and sources come from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UpstreamConfig {
    #[serde(default = "default_git_url")]
    pub git_url: String,

    #[serde(default = "default_release_index_url")]
    pub release_index_url: String,

    #[serde(default = "default_bug_tracker_host")]
    pub bug_tracker_host: String,

    /// Branch or tag whose tree declares the ceiling versions
    #[serde(default = "default_source_ref")]
    pub source_ref: String,

    #[serde(default)]
    pub mirror_dir: Option<PathBuf>,
}

fn default_git_url() -> String {
    "https://git.samba.org/samba.git".to_string()
}

fn default_release_index_url() -> String {
    "https://download.samba.org/pub".to_string()
}

fn default_bug_tracker_host() -> String {
    "bugzilla.samba.org".to_string()
}

fn default_source_ref() -> String {
    "master".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            git_url: default_git_url(),
            release_index_url: default_release_index_url(),
            bug_tracker_host: default_bug_tracker_host(),
            source_ref: default_source_ref(),
            mirror_dir: None,
        }
    }
}

impl UpstreamConfig {
    /// Location of the bare upstream mirror
    pub fn mirror_dir(&self) -> PathBuf {
        match &self.mirror_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("samba-updater")
                .join("upstream.git"),
        }
    }
}

/// One package to keep in sync with upstream.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PackageConfig {
    pub name: String,

    /// Path of the version declaration inside the upstream tree
    pub declaration: String,

    /// Directory of the release index; defaults to the package name
    #[serde(default)]
    pub listing_path: Option<String>,
}

impl PackageConfig {
    pub fn new(name: impl Into<String>, declaration: impl Into<String>) -> Self {
        PackageConfig {
            name: name.into(),
            declaration: declaration.into(),
            listing_path: None,
        }
    }

    pub fn with_listing_path(mut self, path: impl Into<String>) -> Self {
        self.listing_path = Some(path.into());
        self
    }

    pub fn listing_path(&self) -> &str {
        self.listing_path.as_deref().unwrap_or(&self.name)
    }
}

fn default_trailer_tokens() -> Vec<String> {
    vec![
        "signed-off-by".to_string(),
        "reviewed-by".to_string(),
        "autobuild-user".to_string(),
        "autobuild-date".to_string(),
    ]
}

/// Changelog rendering options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    /// Commit trailers dropped from release notes (case-insensitive)
    #[serde(default = "default_trailer_tokens")]
    pub trailer_tokens: Vec<String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            trailer_tokens: default_trailer_tokens(),
        }
    }
}

fn default_repository() -> String {
    "openSUSE_Tumbleweed".to_string()
}

fn default_arch() -> String {
    "x86_64".to_string()
}

/// Local test-build target.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_repository")]
    pub repository: String,

    #[serde(default = "default_arch")]
    pub arch: String,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            repository: default_repository(),
            arch: default_arch(),
            timeout_secs: None,
        }
    }
}

/// Runtime behavior that does not affect version resolution.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BehaviorConfig {
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,

    /// Stop the run at the first failed package
    #[serde(default)]
    pub fail_fast: bool,

    #[serde(default)]
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: default_api_url(),
            user: None,
            email: None,
            upstream: UpstreamConfig::default(),
            packages: default_packages(),
            changelog: ChangelogConfig::default(),
            build: BuildConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Config {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.packages.is_empty() {
            return Err(UpdaterError::config("No packages configured"));
        }
        let mut seen = HashSet::new();
        for package in &self.packages {
            if package.name.trim().is_empty() {
                return Err(UpdaterError::config("Package with an empty name"));
            }
            if !seen.insert(package.name.as_str()) {
                return Err(UpdaterError::config(format!(
                    "Package '{}' is configured twice",
                    package.name
                )));
            }
        }
        Ok(())
    }

    /// Packages to process: all of them, or the named ones in the given order.
    pub fn select_packages(&self, names: &[String]) -> Result<Vec<PackageConfig>> {
        if names.is_empty() {
            return Ok(self.packages.clone());
        }
        names
            .iter()
            .map(|name| {
                self.packages
                    .iter()
                    .find(|p| &p.name == name)
                    .cloned()
                    .ok_or_else(|| {
                        UpdaterError::config(format!("Package '{}' is not configured", name))
                    })
            })
            .collect()
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `samba-updater.toml` in current directory
/// 3. `samba-updater/config.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path).map_err(|e| {
            UpdaterError::config(format!("Cannot read {}: {}", path.display(), e))
        })?
    } else if Path::new(LOCAL_CONFIG).exists() {
        fs::read_to_string(LOCAL_CONFIG)?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("samba-updater").join("config.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_package_order() {
        let config = Config::default();
        let names: Vec<&str> = config
            .packages
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["talloc", "tdb", "tevent", "ldb", "samba"]);
    }

    #[test]
    fn test_listing_path_defaults_to_name() {
        let config = Config::default();
        assert_eq!(config.packages[0].listing_path(), "talloc");
        assert_eq!(config.packages[4].listing_path(), "samba/stable");
        assert_eq!(config.packages[4].declaration, "VERSION");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_select_packages_reorders() {
        let config = Config::default();
        let selected = config
            .select_packages(&["samba".to_string(), "tdb".to_string()])
            .unwrap();
        assert_eq!(selected[0].name, "samba");
        assert_eq!(selected[1].name, "tdb");
    }

    #[test]
    fn test_select_unknown_package() {
        let err = Config::default()
            .select_packages(&["openssl".to_string()])
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("openssl"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = Config::default();
        config.packages.push(PackageConfig::new("tdb", "lib/tdb/wscript"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        let config: Config = toml::from_str("packages = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_mirror_dir() {
        let upstream = UpstreamConfig {
            mirror_dir: Some(PathBuf::from("/srv/mirror.git")),
            ..UpstreamConfig::default()
        };
        assert_eq!(upstream.mirror_dir(), PathBuf::from("/srv/mirror.git"));
        assert!(UpstreamConfig::default()
            .mirror_dir()
            .ends_with("samba-updater/upstream.git"));
    }
}
