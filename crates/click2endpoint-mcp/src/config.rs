use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional `<CLICK2ENDPOINT_HOME>/config.toml`. Environment variables win
/// over every value here.
#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub wizard: Option<WizardCfg>,
    pub auth: Option<AuthCfg>,
    pub mock_server: Option<MockServerCfg>,
    pub nlp: Option<NlpCfg>,
    pub runner: Option<RunnerCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WizardCfg {
    /// "advisory" or "blocking"
    pub validation_mode: Option<String>,
    /// Extra parameter schemas (.toml or .json) merged over the built-in catalog.
    pub schema_file: Option<String>,
    pub max_sessions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthCfg {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MockServerCfg {
    pub default_url: Option<String>,
    pub postman_api_key: Option<String>,
    /// "personal" or "team"
    pub workspace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NlpCfg {
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunnerCfg {
    pub enable: Option<bool>,
    pub timeout_secs: Option<u64>,
}

pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)?;
    let cfg: UserConfig = toml::from_str(&s)?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}
