//! Site configuration for reactwiki.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (REACTWIKI_TIMEZONE, REACTWIKI_DATE_FORMAT)
//! 2. Config file named by REACTWIKI_CONFIG
//! 3. Discovered config file (.reactwiki/config.yaml)
//! 4. User config file (<config dir>/reactwiki/config.yaml)
//! 5. Defaults (English, UTC, `H:i, j M Y`)
//!
//! Config file discovery:
//! - Searches current directory and parents for .reactwiki/config.yaml

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::locator::SignatureConfig;
use crate::timestamp::DateLocale;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Everything the engine needs to know about one wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Signature date format in the site's format language
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// IANA timezone signatures are rendered in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Ten localized digit glyphs, if the site does not use ASCII digits
    #[serde(default)]
    pub digits: Option<Vec<String>>,

    /// Displayed timezone label -> normalized abbreviation
    #[serde(default = "default_timezone_abbreviations")]
    pub timezone_abbreviations: BTreeMap<String, String>,

    /// Month/day name overrides keyed by message key
    #[serde(default)]
    pub messages: HashMap<String, String>,

    /// Signature conventions for the comment locator
    #[serde(default)]
    pub signature: SignatureConfig,
}

fn default_date_format() -> String {
    "H:i, j M Y".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_timezone_abbreviations() -> BTreeMap<String, String> {
    [("UTC".to_string(), "UTC".to_string())].into_iter().collect()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            timezone: default_timezone(),
            digits: None,
            timezone_abbreviations: default_timezone_abbreviations(),
            messages: HashMap::new(),
            signature: SignatureConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Locale tables for the timestamp compiler
    pub fn locale(&self) -> DateLocale {
        DateLocale {
            digits: self.digits.clone(),
            timezone_abbreviations: self.timezone_abbreviations.clone(),
            messages: self.messages.clone(),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Site settings after all overrides
    pub site: SiteConfig,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".reactwiki").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Config file in the user's config directory, if present
fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("reactwiki").join("config.yaml");
    path.exists().then_some(path)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Apply environment overrides on top of file settings
fn apply_env_overrides(site: &mut SiteConfig) {
    if let Ok(tz) = std::env::var("REACTWIKI_TIMEZONE") {
        site.timezone = tz;
    }
    if let Ok(format) = std::env::var("REACTWIKI_DATE_FORMAT") {
        site.date_format = format;
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = match std::env::var("REACTWIKI_CONFIG") {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => find_config_file().or_else(user_config_file),
    };

    let mut site = match &config_file {
        Some(path) => load_config_file(path)?.site,
        None => SiteConfig::default(),
    };
    apply_env_overrides(&mut site);

    Ok(ResolvedConfig { site, config_file })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_site_defaults() {
        let site = SiteConfig::default();
        assert_eq!(site.date_format, "H:i, j M Y");
        assert_eq!(site.timezone, "UTC");
        assert_eq!(site.signature.window_chars, 255);
        assert_eq!(site.locale(), DateLocale::english_utc());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".reactwiki");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
site:
  date_format: 'Y年n月j日 (D) H:i'
  timezone: Asia/Shanghai
  timezone_abbreviations:
    CST: CST
  messages:
    sun: 日
    mon: 一
  signature:
    user_namespaces: [User, User talk, 用户, 用户讨论]
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.site.timezone, "Asia/Shanghai");
        assert_eq!(config.site.date_format, "Y年n月j日 (D) H:i");
        assert_eq!(config.site.messages.get("sun"), Some(&"日".to_string()));
        assert_eq!(config.site.signature.user_namespaces.len(), 4);
        // Unspecified fields keep their defaults
        assert_eq!(config.site.signature.window_chars, 255);
        assert_eq!(
            config.site.signature.contributions_pages,
            vec!["Special:Contributions".to_string()]
        );
    }

    #[test]
    fn test_minimal_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        std::fs::write(&config_path, "version: \"1.0\"\n").unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.site, SiteConfig::default());
    }

    #[test]
    fn test_malformed_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        std::fs::write(&config_path, "site: [not, a, map").unwrap();
        assert!(load_config_file(&config_path).is_err());
    }
}
