use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub github: GitHubConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct GitHubConfig {
    pub token: String,
    pub org: String,
    /// Project board numbers to sync, in order. The first is the primary
    /// project; its failure decides the process exit status.
    pub projects: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "tracked_issues".to_string()
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".boardsync")
        .join("config.toml")
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path())
}

/// Load and validate the config file. A missing or incomplete config aborts
/// the process before any fetch.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!(
            "No config found at {}. Create it with [github] and [store] sections.",
            path.display()
        );
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.github.token.trim().is_empty() {
        bail!("github.token must not be empty");
    }
    if config.github.org.trim().is_empty() {
        bail!("github.org must not be empty");
    }
    if config.github.projects.is_empty() {
        bail!("github.projects must list at least one project number");
    }
    if config.store.url.trim().is_empty() {
        bail!("store.url must not be empty");
    }
    if config.store.api_key.trim().is_empty() {
        bail!("store.api_key must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"
[github]
token = "ghp_abc"
org = "acme"
projects = [7, 12]

[store]
url = "https://db.example.com"
api_key = "service-key"
"#;

    #[test]
    fn loads_valid_config() {
        let file = write_config(VALID);
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.github.org, "acme");
        assert_eq!(config.github.projects, vec![7, 12]);
        assert_eq!(config.store.table, "tracked_issues");
    }

    #[test]
    fn table_name_can_be_overridden() {
        let file = write_config(&VALID.replace(
            "api_key = \"service-key\"",
            "api_key = \"service-key\"\ntable = \"issues\"",
        ));
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.store.table, "issues");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_config_from(Path::new("/nonexistent/boardsync/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn blank_token_is_an_error() {
        let file = write_config(&VALID.replace("ghp_abc", "  "));
        let result = load_config_from(file.path());
        assert!(result.unwrap_err().to_string().contains("github.token"));
    }

    #[test]
    fn empty_project_list_is_an_error() {
        let file = write_config(&VALID.replace("[7, 12]", "[]"));
        let result = load_config_from(file.path());
        assert!(result.unwrap_err().to_string().contains("github.projects"));
    }
}
