//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::Project;

/// Default supplier lead time (weeks) above which a part counts as long-lead
pub const DEFAULT_LONG_LEAD_WEEKS: f64 = 6.0;

/// Depot configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default author for new records
    pub author: Option<String>,

    /// Editor command for `depot <type> edit`
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Currency symbol for prices and values
    pub currency: Option<String>,

    /// Lead time threshold in weeks for supply risk flags
    pub long_lead_weeks: Option<f64>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/depot/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Project config (.depot/config.yaml)
        if let Ok(project) = Project::discover() {
            if let Some(project_config) = Self::read_file(&project.depot_dir().join("config.yaml")) {
                config.merge(project_config);
            }
        }

        config.apply_env();
        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(author) = std::env::var("DEPOT_AUTHOR") {
            self.author = Some(author);
        }
        if let Ok(editor) = std::env::var("DEPOT_EDITOR") {
            self.editor = Some(editor);
        }
        if let Ok(currency) = std::env::var("DEPOT_CURRENCY") {
            self.currency = Some(currency);
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "depot")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.currency.is_some() {
            self.currency = other.currency;
        }
        if other.long_lead_weeks.is_some() {
            self.long_lead_weeks = other.long_lead_weeks;
        }
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Currency symbol, "$" unless configured
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("$")
    }

    /// Format an amount with the configured currency symbol
    pub fn money(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency(), amount)
    }

    pub fn long_lead_weeks(&self) -> f64 {
        self.long_lead_weeks.unwrap_or(DEFAULT_LONG_LEAD_WEEKS)
    }

    /// Run the editor on a file, handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &std::path::Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let parts: Vec<&str> = editor.split_whitespace().collect();

        let (cmd, args) = match parts.split_first() {
            Some((cmd, args)) => (*cmd, args),
            None => ("vi", &[][..]),
        };

        std::process::Command::new(cmd).args(args).arg(file_path).status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            author: Some("base".into()),
            currency: Some("$".into()),
            ..Default::default()
        };
        base.merge(Config {
            currency: Some("€".into()),
            long_lead_weeks: Some(8.0),
            ..Default::default()
        });
        assert_eq!(base.author.as_deref(), Some("base"));
        assert_eq!(base.currency(), "€");
        assert_eq!(base.long_lead_weeks(), 8.0);
    }

    #[test]
    fn test_money_formatting() {
        let config = Config {
            currency: Some("£".into()),
            ..Default::default()
        };
        assert_eq!(config.money(12.5), "£12.50");
        assert_eq!(Config::default().money(3.0), "$3.00");
    }

    #[test]
    fn test_parse_project_config() {
        let config: Config = serde_yml::from_str("currency: \"R\"\nlong_lead_weeks: 4\n").unwrap();
        assert_eq!(config.currency(), "R");
        assert_eq!(config.long_lead_weeks(), 4.0);
    }
}
