use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::model::{Direction, OrderBy};

/// Directory, relative to the project root, holding sift's state.
pub const SIFT_DIR: &str = ".sift";

/// Environment variable naming the requesting user.
pub const USER_ENV: &str = "SIFT_USER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store location, relative to the project root unless absolute.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub direction: Direction,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            order_by: OrderBy::default(),
            direction: Direction::default(),
        }
    }
}

impl QueryConfig {
    /// Clamp a requested page size to `1..=max_page_size`, falling back to the
    /// configured default.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Default requester id.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
    pub requester: Option<String>,
}

impl ProjectConfig {
    /// Absolute location of the store for a project rooted at `project_root`.
    #[must_use]
    pub fn store_path(&self, project_root: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            project_root.join(&self.store.path)
        }
    }
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(SIFT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("sift/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(
    project_root: &Path,
    cli_json: bool,
    cli_user: Option<&str>,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);
    let requester = resolve_requester(cli_user, env::var(USER_ENV).ok(), user.user.clone());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
        requester,
    })
}

/// First non-blank of: CLI flag, `SIFT_USER`, user config.
#[must_use]
pub fn resolve_requester(
    cli_user: Option<&str>,
    env_user: Option<String>,
    config_user: Option<String>,
) -> Option<String> {
    [cli_user.map(ToString::to_string), env_user, config_user]
        .into_iter()
        .flatten()
        .map(|user| user.trim().to_string())
        .find(|user| !user.is_empty())
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(SIFT_DIR).join("sift.sqlite3")
}

const fn default_page_size() -> u32 {
    50
}

const fn default_max_page_size() -> u32 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store.path, PathBuf::from(".sift/sift.sqlite3"));
        assert_eq!(cfg.query.page_size, 50);
        assert_eq!(cfg.query.max_page_size, 500);
        assert_eq!(cfg.query.order_by, OrderBy::Updated);
        assert_eq!(cfg.query.direction, Direction::Descending);
    }

    #[test]
    fn project_config_overrides_are_read() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(SIFT_DIR)).expect("create .sift");
        std::fs::write(
            root.path().join(".sift/config.toml"),
            r#"
[store]
path = "data/items.db"

[query]
page_size = 20
order_by = "title"
direction = "ascending"
"#,
        )
        .expect("write config");

        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.store_path(root.path()), root.path().join("data/items.db"));
        assert_eq!(cfg.query.page_size, 20);
        assert_eq!(cfg.query.max_page_size, 500);
        assert_eq!(cfg.query.order_by, OrderBy::Title);
        assert_eq!(cfg.query.direction, Direction::Ascending);
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let root = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir_all(root.path().join(SIFT_DIR)).expect("create .sift");
        std::fs::write(root.path().join(".sift/config.toml"), "[query]\norder_by = \"mood\"\n")
            .expect("write config");

        let err = load_project_config(root.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }

    #[test]
    fn effective_limit_is_clamped() {
        let cfg = QueryConfig::default();
        assert_eq!(cfg.effective_limit(None), 50);
        assert_eq!(cfg.effective_limit(Some(0)), 1);
        assert_eq!(cfg.effective_limit(Some(10_000)), 500);
        assert_eq!(cfg.effective_limit(Some(75)), 75);
    }

    #[test]
    fn requester_precedence() {
        assert_eq!(
            resolve_requester(Some("cli"), Some("env".into()), Some("cfg".into())).as_deref(),
            Some("cli")
        );
        assert_eq!(
            resolve_requester(None, Some("env".into()), Some("cfg".into())).as_deref(),
            Some("env")
        );
        assert_eq!(
            resolve_requester(Some("  "), None, Some("cfg".into())).as_deref(),
            Some("cfg")
        );
        assert_eq!(resolve_requester(None, None, None), None);
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        let pretty = resolve_output(false, Some("table".to_string()), Some("human".to_string()));
        assert_eq!(pretty, "pretty");

        let text = resolve_output(false, Some("human".to_string()), Some("table".to_string()));
        assert_eq!(text, "text");
    }

    #[test]
    fn user_config_parses_user_and_output() {
        let cfg: UserConfig = toml::from_str("user = \"alice\"\noutput = \"json\"\n").expect("parse");
        assert_eq!(cfg.user.as_deref(), Some("alice"));
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }
}
