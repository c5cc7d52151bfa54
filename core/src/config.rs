use crate::{authz::ViewPolicy, hierarchy::{RootPolicy, DEFAULT_MAX_DEPTH}, rubric::Rubric};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key; never stored in the file.
    pub api_key_env: String,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-3-5-haiku-20241022".into(),
            api_key_env: "ANTHROPIC_API_KEY".into(),
            max_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AppFile {
    db_path: String,
    system_password: String,
    #[serde(default)]
    root_policy: RootPolicy,
    #[serde(default)]
    view_policy: ViewPolicy,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    http_addr: Option<String>,
    #[serde(default)]
    analysis: AnalysisConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub system_password: String,
    pub root_policy: RootPolicy,
    pub view_policy: ViewPolicy,
    pub max_depth: usize,
    pub http_addr: String,
    pub analysis: AnalysisConfig,
    pub rubric: Rubric,
}

impl AppConfig {
    /// Load from the data/ directory.
    /// In tests, use AppConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/app.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: AppFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid {path}: {e}"))?;

        let rubric_path = format!("{data_dir}/rubric/rubric.json");
        let rubric = match std::fs::read_to_string(&rubric_path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| anyhow::anyhow!("Invalid {rubric_path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No {rubric_path}; using built-in rubric");
                Rubric::builtin()
            }
            Err(e) => anyhow::bail!("Cannot read {rubric_path}: {e}"),
        };

        Ok(Self {
            db_path: file.db_path,
            system_password: file.system_password,
            root_policy: file.root_policy,
            view_policy: file.view_policy,
            max_depth: file.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            http_addr: file.http_addr.unwrap_or_else(|| "127.0.0.1:8080".into()),
            analysis: file.analysis,
            rubric,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            db_path: ":memory:".into(),
            system_password: "iso9001".into(),
            root_policy: RootPolicy::PrimaryOnly,
            view_policy: ViewPolicy::AnyAuthenticated,
            max_depth: DEFAULT_MAX_DEPTH,
            http_addr: "127.0.0.1:0".into(),
            analysis: AnalysisConfig::default(),
            rubric: Rubric::builtin(),
        }
    }
}
