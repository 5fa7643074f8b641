use crate::cli::Cli;
use crate::env::Env;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = ".keyhold.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    /// Verbose mode (not stored in config file)
    #[serde(skip)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Reconnect to a cached agent instead of starting a new one.
    #[serde(default = "default_reuse")]
    pub reuse: bool,

    /// How long a cached agent record stays valid.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            reuse: default_reuse(),
            expiry_hours: default_expiry_hours(),
        }
    }
}

fn default_reuse() -> bool {
    true
}

fn default_expiry_hours() -> u64 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SshConfig {
    /// SSH client config to consult, instead of ~/.ssh/config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,

    /// Identity file that wins over every other resolution source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
}

impl Config {
    /// Load configuration with precedence:
    /// 1. CLI flags (applied later via with_cli_overrides)
    /// 2. Environment variables
    /// 3. Project config (.keyhold.toml in the working directory)
    /// 4. Global config (~/.keyhold.toml)
    /// 5. Built-in defaults
    pub fn load(project_root: &Path, env: &dyn Env) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load global config
        if let Some(home) = env.home_dir() {
            let global_config = home.join(CONFIG_FILE_NAME);
            if global_config.exists() {
                config = config.merge(Self::from_file(&global_config)?);
            }
        }

        // 2. Load project config
        let project_config = project_root.join(CONFIG_FILE_NAME);
        if project_config.exists() {
            config = config.merge(Self::from_file(&project_config)?);
        }

        // 3. Apply environment variables
        config = config.merge_env(env);

        Ok(config)
    }

    /// Load configuration from a TOML file
    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(mut self, other: Self) -> Self {
        if other.agent.reuse != default_reuse() {
            self.agent.reuse = other.agent.reuse;
        }
        if other.agent.expiry_hours != default_expiry_hours() {
            self.agent.expiry_hours = other.agent.expiry_hours;
        }

        if other.ssh.config_path.is_some() {
            self.ssh.config_path = other.ssh.config_path;
        }
        if other.ssh.identity_file.is_some() {
            self.ssh.identity_file = other.ssh.identity_file;
        }

        self
    }

    /// Apply environment variable overrides
    fn merge_env(mut self, env: &dyn Env) -> Self {
        if let Some(reuse) = env.var("KEYHOLD_REUSE_AGENT") {
            if let Ok(reuse) = reuse.parse::<bool>() {
                self.agent.reuse = reuse;
            }
        }

        if let Some(hours) = env.var("KEYHOLD_EXPIRY_HOURS") {
            if let Ok(hours) = hours.parse::<u64>() {
                self.agent.expiry_hours = hours;
            }
        }

        if let Some(config_path) = env.var("KEYHOLD_SSH_CONFIG") {
            if !config_path.is_empty() {
                self.ssh.config_path = Some(config_path);
            }
        }

        self
    }

    /// Apply CLI overrides (highest precedence)
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        self.verbose = cli.verbose;

        if let Some(identity) = &cli.identity {
            self.ssh.identity_file = Some(identity.clone());
        }

        if cli.no_reuse {
            self.agent.reuse = false;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnv;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.agent.reuse);
        assert_eq!(config.agent.expiry_hours, 24);
        assert!(config.ssh.config_path.is_none());
        assert!(config.ssh.identity_file.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_parsing() {
        let toml = r#"
            [agent]
            reuse = false
            expiry_hours = 48

            [ssh]
            config_path = "~/.ssh/alt_config"
            identity_file = "~/.ssh/work_key"
        "#;

        let config: Config = toml::from_str(toml).expect("Failed to parse config");
        assert!(!config.agent.reuse);
        assert_eq!(config.agent.expiry_hours, 48);
        assert_eq!(config.ssh.config_path.as_deref(), Some("~/.ssh/alt_config"));
        assert_eq!(config.ssh.identity_file.as_deref(), Some("~/.ssh/work_key"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("[ssh]\nidentity_file = \"key\"\n").unwrap();
        assert!(config.agent.reuse);
        assert_eq!(config.agent.expiry_hours, 24);
        assert_eq!(config.ssh.identity_file.as_deref(), Some("key"));
    }

    #[test]
    fn test_merge_prefers_other_when_set() {
        let base = Config::default();
        let other: Config = toml::from_str("[agent]\nexpiry_hours = 6\n").unwrap();

        let merged = base.merge(other);
        assert_eq!(merged.agent.expiry_hours, 6);
        assert!(merged.agent.reuse);
    }

    #[test]
    fn test_load_merges_global_and_project_config() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(
            home.path().join(CONFIG_FILE_NAME),
            "[agent]\nexpiry_hours = 12\n",
        )
        .unwrap();
        std::fs::write(
            project.path().join(CONFIG_FILE_NAME),
            "[agent]\nreuse = false\n",
        )
        .unwrap();

        let env = MemoryEnv::with_home(home.path());
        let config = Config::load(project.path(), &env).unwrap();

        // Global value survives, project value overrides.
        assert_eq!(config.agent.expiry_hours, 12);
        assert!(!config.agent.reuse);
    }

    #[test]
    fn test_env_overrides() {
        let env = MemoryEnv::new();
        env.set_var("KEYHOLD_REUSE_AGENT", "false");
        env.set_var("KEYHOLD_EXPIRY_HOURS", "6");
        env.set_var("KEYHOLD_SSH_CONFIG", "/etc/ssh/alt_config");

        let config = Config::default().merge_env(&env);
        assert!(!config.agent.reuse);
        assert_eq!(config.agent.expiry_hours, 6);
        assert_eq!(config.ssh.config_path.as_deref(), Some("/etc/ssh/alt_config"));
    }

    #[test]
    fn test_env_ignores_unparseable_values() {
        let env = MemoryEnv::new();
        env.set_var("KEYHOLD_REUSE_AGENT", "maybe");
        env.set_var("KEYHOLD_EXPIRY_HOURS", "soon");

        let config = Config::default().merge_env(&env);
        assert!(config.agent.reuse);
        assert_eq!(config.agent.expiry_hours, 24);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["keyhold", "-v", "--no-reuse", "-i", "/custom/key", "status"]);
        let config = Config::default().with_cli_overrides(&cli);

        assert!(config.verbose);
        assert!(!config.agent.reuse);
        assert_eq!(config.ssh.identity_file.as_deref(), Some("/custom/key"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join(CONFIG_FILE_NAME), "[agent\nbroken").unwrap();

        let env = MemoryEnv::new();
        assert!(Config::load(project.path(), &env).is_err());
    }
}
