use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub team: TeamConfig,
    #[serde(default)]
    pub vocab: VocabConfig,
    #[serde(default)]
    pub protected: ProtectedConfig,
    #[serde(default)]
    pub docs_index: DocsIndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TeamConfig {
    pub members: Vec<String>,
    pub reviewer: String,
    #[serde(default)]
    pub default_author: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VocabConfig {
    #[serde(default = "default_areas")]
    pub areas: Vec<String>,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            areas: default_areas(),
        }
    }
}

fn default_areas() -> Vec<String> {
    ["api", "config", "database", "lib", "types", "ui"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProtectedConfig {
    #[serde(default)]
    pub extra_globs: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocsIndexConfig {
    #[serde(default = "default_docs_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for DocsIndexConfig {
    fn default() -> Self {
        Self {
            root: default_docs_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_docs_root() -> PathBuf {
    PathBuf::from("docs")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

impl Config {
    /// Minimal in-memory config for tests and scaffolding commands.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("team.db"),
            },
            team: TeamConfig {
                members: vec!["Queen".to_string(), "Pazz".to_string()],
                reviewer: "Pazz".to_string(),
                default_author: String::new(),
            },
            vocab: VocabConfig::default(),
            protected: ProtectedConfig::default(),
            docs_index: DocsIndexConfig::default(),
        }
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.team.members.iter().any(|m| m == name)
    }

    pub fn is_area(&self, area: &str) -> bool {
        self.vocab.areas.iter().any(|a| a == area)
    }

    /// Valid learning categories: every area plus the cross-cutting "general".
    pub fn is_learning_category(&self, category: &str) -> bool {
        category == "general" || self.is_area(category)
    }

    /// Resolve the acting team member: `--as` flag wins, then
    /// `[team].default_author`.
    pub fn resolve_author(&self, as_flag: Option<&str>) -> Result<String> {
        let name = match as_flag {
            Some(name) => name.to_string(),
            None if !self.team.default_author.is_empty() => self.team.default_author.clone(),
            None => anyhow::bail!(
                "No author given. Pass --as <name> or set [team].default_author in config."
            ),
        };
        if !self.is_member(&name) {
            anyhow::bail!(
                "Unknown team member '{}'. Must be one of: {}",
                name,
                self.team.members.join(", ")
            );
        }
        Ok(name)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate team
    if config.team.members.is_empty() {
        anyhow::bail!("[team].members must not be empty");
    }
    if !config.is_member(&config.team.reviewer) {
        anyhow::bail!(
            "[team].reviewer '{}' is not in [team].members",
            config.team.reviewer
        );
    }
    if !config.team.default_author.is_empty() && !config.is_member(&config.team.default_author) {
        anyhow::bail!(
            "[team].default_author '{}' is not in [team].members",
            config.team.default_author
        );
    }

    // Validate vocab
    if config.vocab.areas.is_empty() {
        anyhow::bail!("[vocab].areas must not be empty");
    }

    // Glob patterns must compile; fail at load time, not first use
    for pattern in config
        .protected
        .extra_globs
        .iter()
        .chain(&config.docs_index.include_globs)
        .chain(&config.docs_index.exclude_globs)
    {
        globset::Glob::new(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        if config.team.members.is_empty() {
            anyhow::bail!("[team].members must not be empty");
        }
        if !config.is_member(&config.team.reviewer) {
            anyhow::bail!("reviewer not in members");
        }
        Ok(config)
    }

    #[test]
    fn test_minimal_defaults() {
        let cfg = Config::minimal();
        assert!(cfg.is_member("Queen"));
        assert!(cfg.is_learning_category("general"));
        assert!(!cfg.is_learning_category("nonsense"));
    }

    #[test]
    fn test_reviewer_must_be_member() {
        let result = parse(
            r#"
            [db]
            path = "team.db"
            [team]
            members = ["Fizz"]
            reviewer = "Ghost"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_author_prefers_flag() {
        let cfg = Config::minimal();
        assert_eq!(cfg.resolve_author(Some("Pazz")).unwrap(), "Pazz");
        assert!(cfg.resolve_author(Some("Ghost")).is_err());
        // No flag and no default_author configured
        assert!(cfg.resolve_author(None).is_err());
    }
}
