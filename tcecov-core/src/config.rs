//! Configuration for tcecov

use crate::CovError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file name looked up by the CLI
pub const CONFIG_FILE_NAME: &str = "tcecov.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# tcecov configuration

# Build tree the counter files and artifacts were produced from
build_root = "."
# Build tree as visible on this machine (defaults to build_root)
# platform_build_root = "/srv/build"

# Install tree layout on this machine, inside the platform build tree
install_root = "/usr/local"
# Install tree as recorded by the host that produced the artifacts
host_install_root = "/usr/local"

# Directory holding .gcov artifacts and summary pages
tcedir = "tce"

# Where to list artifacts whose sources could not be resolved
# unresolved_output = "tce/unresolved.txt"

# Per-component summary pages rolled up by `tcecov summary`
# [[sums]]
# name = "agents/unix/conf"
# file = "agents/unix/conf/index.html"

[merge]
# Program (and leading arguments) merging two counter files
command = ["tce_merge"]
# Give up on the merge program after this long (e.g., "30s", "5m", "1h")
timeout = "5m"
"#;

/// tcecov configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_root")]
    pub build_root: PathBuf,
    #[serde(default)]
    pub platform_build_root: Option<PathBuf>,
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,
    #[serde(default = "default_install_root")]
    pub host_install_root: PathBuf,
    #[serde(default = "default_tcedir")]
    pub tcedir: PathBuf,
    #[serde(default)]
    pub unresolved_output: Option<PathBuf>,
    #[serde(default)]
    pub sums: Vec<SummarySource>,
    #[serde(default)]
    pub merge: MergeConfig,
}

/// One per-component summary page and the slash-delimited name it is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySource {
    pub name: String,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_merge_command")]
    pub command: Vec<String>,
    #[serde(default = "default_merge_timeout")]
    pub timeout: String,
}

/// The subset of [`Config`] the artifact resolvers need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub install_root: PathBuf,
    pub host_install_root: PathBuf,
    pub platform_build_root: PathBuf,
}

// Default value functions
fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_install_root() -> PathBuf {
    PathBuf::from("/usr/local")
}
fn default_tcedir() -> PathBuf {
    PathBuf::from("tce")
}
fn default_merge_command() -> Vec<String> {
    vec!["tce_merge".to_string()]
}
fn default_merge_timeout() -> String {
    "5m".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_root: default_root(),
            platform_build_root: None,
            install_root: default_install_root(),
            host_install_root: default_install_root(),
            tcedir: default_tcedir(),
            unresolved_output: None,
            sums: Vec::new(),
            merge: MergeConfig::default(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            command: default_merge_command(),
            timeout: default_merge_timeout(),
        }
    }
}

impl Config {
    /// Load config from a TOML file, or JSON when the extension is `.json`
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Err(CovError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| CovError::ConfigParse(e.to_string()))
    }

    /// Parse config from JSON string
    pub fn from_json(content: &str) -> crate::Result<Self> {
        serde_json::from_str(content).map_err(|e| CovError::ConfigParse(e.to_string()))
    }

    /// Build tree as seen from this machine
    pub fn platform_build_root(&self) -> &Path {
        self.platform_build_root
            .as_deref()
            .unwrap_or(&self.build_root)
    }

    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            install_root: self.install_root.clone(),
            host_install_root: self.host_install_root.clone(),
            platform_build_root: self.platform_build_root().to_path_buf(),
        }
    }

    /// How long the merge program may run
    pub fn merge_timeout(&self) -> crate::Result<Duration> {
        parse_timeout(&self.merge.timeout)
    }

    /// Summary page path, relative entries taken from `tcedir`
    pub fn summary_path(&self, source: &SummarySource) -> PathBuf {
        if source.file.is_absolute() {
            source.file.clone()
        } else {
            self.tcedir.join(&source.file)
        }
    }
}

/// `<count><unit>` with unit `s`, `m`, `h` or `d`
fn parse_timeout(text: &str) -> crate::Result<Duration> {
    let invalid = || {
        CovError::ConfigParse(format!(
            "merge timeout '{}' is not <count><s|m|h|d>",
            text
        ))
    };
    let text = text.trim();
    let (split, unit) = text.char_indices().last().ok_or_else(invalid)?;
    let count: u64 = text[..split].parse().map_err(|_| invalid())?;
    let scale: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        _ => return Err(invalid()),
    };
    let secs = count.checked_mul(scale).ok_or_else(invalid)?;
    Ok(Duration::from_secs(secs))
}
