use serde::Deserialize;
use skillgate_logging::LogFormat;
use skillgate_types::{SizeUnit, DEFAULT_BUDGET};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[skills]
directories = []  # Extra skill directories; ~ is expanded
personal = true   # ~/.skillgate/skills
project = true    # ./.skillgate/skills

[budget]
max_size = 16000
unit = "chars"  # chars or tokens

[logging]
level = "info"  # trace, debug, info, warn, error
format = "pretty"  # pretty or json
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct SkillsConfig {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default = "default_true")]
    pub personal: bool,
    #[serde(default = "default_true")]
    pub project: bool,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            personal: true,
            project: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BudgetConfig {
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    #[serde(default)]
    pub unit: SizeUnit,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_BUDGET,
            unit: SizeUnit::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_size() -> usize {
    DEFAULT_BUDGET
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.skillgate/skillgate.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".skillgate").join("skillgate.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillgate/skillgate.toml (auto-created if missing)
    /// 2. Local override: ./skillgate.toml (workspace, optional)
    /// 3. Environment variables with SKILLGATE__ prefix
    /// 4. Convenience variables SKILLGATE_MAX_SIZE and SKILLGATE_SKILLS_DIR
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("skillgate").required(false))
            .add_source(config::Environment::with_prefix("SKILLGATE").separator("__"));

        if let Ok(size) = env::var("SKILLGATE_MAX_SIZE") {
            let size: i64 = size
                .parse()
                .map_err(|e| anyhow::anyhow!("SKILLGATE_MAX_SIZE must be a number: {}", e))?;
            config_builder = config_builder.set_override("budget.max_size", size)?;
        }

        if let Ok(dir) = env::var("SKILLGATE_SKILLS_DIR") {
            config_builder = config_builder.set_override("skills.directories", vec![dir])?;
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Apply command-line flags, which take precedence over every file and env layer
    pub fn apply_cli(&mut self, cli: &Cli) {
        self.skills
            .directories
            .extend(cli.skills_dirs.iter().map(|d| d.display().to_string()));

        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Configured directories with `~` expanded
    pub fn skill_directories(&self) -> Vec<PathBuf> {
        self.skills
            .directories
            .iter()
            .map(|dir| expand_home(dir))
            .collect()
    }
}

/// Expand a leading `~` to the home directory
fn expand_home(dir: &str) -> PathBuf {
    let rest = if dir == "~" {
        Some("")
    } else {
        dir.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(dir).to_path_buf(),
    }
}
