//! Verifier configuration.
//!
//! A TOML file with two sections:
//!
//! ```toml
//! [bounds]
//! addresses = 3
//! max_value = 2
//! max_depth = 2
//! max_states = 20000
//!
//! [tools]
//! classpath = "/opt/viper/viper.jar"
//! z3_path = "/usr/bin/z3"
//! ```
//!
//! `[tools]` records the external tool locations a proving backend would
//! consume. Each entry can be overridden from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_types::Address;
use tracing::debug;

use crate::error::ConfigError;

/// Exploration bounds of the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    /// Number of distinct accounts (`0x0001..`).
    pub addresses: u64,
    /// Largest `uint256` value enumerated for arguments, payments and
    /// quantified variables.
    pub max_value: u128,
    /// Transactions executed after deployment.
    pub max_depth: usize,
    /// Distinct states kept before exploration is truncated.
    pub max_states: usize,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            addresses: 3,
            max_value: 2,
            max_depth: 2,
            max_states: 20_000,
        }
    }
}

impl Bounds {
    pub fn address_universe(&self) -> Vec<Address> {
        (1..=self.addresses).map(Address).collect()
    }

    /// Values a quantified `uint256` variable ranges over.
    pub fn quantifier_domain(&self) -> Vec<u128> {
        (0..=self.max_value).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addresses == 0 || self.addresses > 16 {
            return Err(ConfigError::Invalid(format!(
                "bounds.addresses must be between 1 and 16, got {}",
                self.addresses
            )));
        }
        if self.max_value > 64 {
            return Err(ConfigError::Invalid(format!(
                "bounds.max_value must be at most 64, got {}",
                self.max_value
            )));
        }
        if self.max_states == 0 {
            return Err(ConfigError::Invalid("bounds.max_states must be positive".into()));
        }
        Ok(())
    }
}

/// Locations of the external tools of a proving backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Java classpath of the verification backend.
    pub classpath: Option<String>,
    /// SMT solver executable.
    pub z3_path: Option<PathBuf>,
    /// Auxiliary verifier executable.
    pub boogie_path: Option<PathBuf>,
    /// Type-checker installation.
    pub mypy_path: Option<PathBuf>,
}

impl ToolPaths {
    pub const CLASSPATH_VAR: &'static str = "VIPERJAVAPATH";
    pub const Z3_VAR: &'static str = "Z3_EXE";
    pub const BOOGIE_VAR: &'static str = "BOOGIE_EXE";
    pub const MYPY_VAR: &'static str = "MYPYDIR";

    /// Apply environment overrides, then look for `z3` on `PATH`.
    pub fn resolve(self) -> Self {
        let path = std::env::var_os("PATH");
        let searched = path
            .as_ref()
            .and_then(|p| search_path(std::env::split_paths(p), "z3"));
        self.resolve_with(|name| std::env::var(name).ok(), searched)
    }

    /// Resolution with an explicit environment, for testing.
    pub fn resolve_with<F>(mut self, env: F, z3_on_path: Option<PathBuf>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(classpath) = env(Self::CLASSPATH_VAR) {
            self.classpath = Some(classpath);
        }
        if let Some(z3) = env(Self::Z3_VAR) {
            self.z3_path = Some(PathBuf::from(z3));
        }
        if let Some(boogie) = env(Self::BOOGIE_VAR) {
            self.boogie_path = Some(PathBuf::from(boogie));
        }
        if let Some(mypy) = env(Self::MYPY_VAR) {
            self.mypy_path = Some(PathBuf::from(mypy));
        }
        if self.z3_path.is_none() {
            self.z3_path = z3_on_path;
        }
        self
    }
}

fn search_path(dirs: impl Iterator<Item = PathBuf>, executable: &str) -> Option<PathBuf> {
    dirs.map(|dir| dir.join(executable))
        .find(|candidate| candidate.is_file())
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub bounds: Bounds,
    pub tools: ToolPaths,
}

impl TallyConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            debug!(path = %config_path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: TallyConfig = toml::from_str(contents)?;
        config.bounds.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tally").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_bounds_are_valid() {
        let bounds = Bounds::default();
        assert!(bounds.validate().is_ok());
        assert_eq!(bounds.address_universe().len(), 3);
        assert_eq!(bounds.quantifier_domain(), vec![0, 1, 2]);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = TallyConfig::from_toml_str("[bounds]\nmax_depth = 4\n").unwrap();
        assert_eq!(config.bounds.max_depth, 4);
        assert_eq!(config.bounds.addresses, 3);
        assert!(config.tools.z3_path.is_none());
    }

    #[test]
    fn invalid_bounds_rejected() {
        let err = TallyConfig::from_toml_str("[bounds]\naddresses = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn garbage_rejected() {
        let err = TallyConfig::from_toml_str("[bounds\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let config = TallyConfig::load(Some(Path::new("/nonexistent/tally/config.toml"))).unwrap();
        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn load_reads_tools() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tools]\nz3_path = \"/opt/z3/bin/z3\"\nclasspath = \"viper.jar\"").unwrap();
        let config = TallyConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.tools.z3_path, Some(PathBuf::from("/opt/z3/bin/z3")));
        assert_eq!(config.tools.classpath.as_deref(), Some("viper.jar"));
    }

    #[test]
    fn environment_overrides_file() {
        let tools = ToolPaths {
            z3_path: Some(PathBuf::from("/file/z3")),
            ..ToolPaths::default()
        };
        let resolved = tools.resolve_with(
            |name| match name {
                "Z3_EXE" => Some("/env/z3".to_string()),
                "BOOGIE_EXE" => Some("/env/boogie".to_string()),
                _ => None,
            },
            Some(PathBuf::from("/usr/bin/z3")),
        );
        assert_eq!(resolved.z3_path, Some(PathBuf::from("/env/z3")));
        assert_eq!(resolved.boogie_path, Some(PathBuf::from("/env/boogie")));
        assert!(resolved.classpath.is_none());
    }

    #[test]
    fn path_search_fills_missing_z3() {
        let resolved = ToolPaths::default().resolve_with(|_| None, Some(PathBuf::from("/bin/z3")));
        assert_eq!(resolved.z3_path, Some(PathBuf::from("/bin/z3")));
    }
}
