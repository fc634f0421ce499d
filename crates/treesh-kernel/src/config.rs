//! Shell configuration.
//!
//! Loaded from `~/.config/treesh/config.toml` (or the platform equivalent).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use treesh_types::{AddressingMode, CanonicalPath, ListOptions, SortKey};

use crate::cache::TtlPolicy;

/// Configuration for a treesh session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Session user; drives `~` expansion and the starting directory.
    #[serde(default)]
    pub user: Option<String>,

    /// Addressing mode at startup.
    #[serde(default)]
    pub mode: AddressingMode,

    #[serde(default)]
    pub overlay: OverlayConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub listing: ListingConfig,
}

/// The executable catalog overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Mount point of the catalog.
    #[serde(default = "default_mount")]
    pub mount: String,

    /// Executables listed under the mount point.
    #[serde(default)]
    pub executables: Vec<String>,
}

fn default_mount() -> String {
    "/bin".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            mount: default_mount(),
            executables: Vec::new(),
        }
    }
}

/// Listing cache time-to-live settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for paths not matched by any rule.
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,

    /// Per-subtree TTLs. The longest matching prefix wins.
    #[serde(default)]
    pub rules: Vec<TtlRule>,
}

fn default_ttl() -> u64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl(),
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlRule {
    pub prefix: String,
    pub ttl_secs: u64,
}

/// Default listing order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListingConfig {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub reverse: bool,
}

impl ShellConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "treesh")
            .context("Could not determine config directory")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Cache policy described by the `[cache]` table.
    pub fn ttl_policy(&self) -> TtlPolicy {
        self.cache.rules.iter().fold(
            TtlPolicy::new(Duration::from_secs(self.cache.default_ttl_secs)),
            |policy, rule| {
                policy.with_rule(
                    CanonicalPath::normalize(&rule.prefix),
                    Duration::from_secs(rule.ttl_secs),
                )
            },
        )
    }

    /// Listing order described by the `[listing]` table.
    pub fn list_options(&self) -> ListOptions {
        ListOptions::sorted_by(self.listing.sort).reversed(self.listing.reverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShellConfig::default();
        assert_eq!(config.user, None);
        assert_eq!(config.mode, AddressingMode::Logical);
        assert_eq!(config.overlay.mount, "/bin");
        assert_eq!(config.cache.default_ttl_secs, 60);
        assert_eq!(config.listing.sort, SortKey::Name);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
user = "alice"
mode = "physical"

[overlay]
mount = "/usr/bin"
executables = ["pl-dircopy", "pl-fshack"]

[cache]
default_ttl_secs = 30

[[cache.rules]]
prefix = "/scratch"
ttl_secs = 5

[[cache.rules]]
prefix = "/scratch/archive"
ttl_secs = 3600

[listing]
sort = "size"
reverse = true
"#;

        let config: ShellConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.mode, AddressingMode::Physical);
        assert_eq!(config.overlay.executables.len(), 2);

        let policy = config.ttl_policy();
        let ttl = |p: &str| policy.ttl_for(&CanonicalPath::normalize(p)).as_secs();
        assert_eq!(ttl("/home"), 30);
        assert_eq!(ttl("/scratch/tmp"), 5);
        assert_eq!(ttl("/scratch/archive/2024"), 3600);

        let opts = config.list_options();
        assert_eq!(opts.sort, SortKey::Size);
        assert!(opts.reverse);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: ShellConfig = toml::from_str("").expect("parse failed");
        assert_eq!(config.overlay.mount, "/bin");
        assert!(config.cache.rules.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user = \"bob\"\n[listing]\nsort = \"modified\"\n").expect("write");

        let config = ShellConfig::load_from(&path).expect("load failed");
        assert_eq!(config.user.as_deref(), Some("bob"));
        assert_eq!(config.listing.sort, SortKey::Modified);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mode = \"sideways\"\n").expect("write");

        let err = ShellConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_missing_file_is_an_error_for_load_from() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ShellConfig::load_from(&dir.path().join("nope.toml")).is_err());
    }
}
