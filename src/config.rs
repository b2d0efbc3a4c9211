use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quill::llm::{DEFAULT_API_KEY_ENV, OpenAiConfig};
use quill::quality::QualityConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub quality: QualitySettings,
    pub prompts: PromptsConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub base_url: String,
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let defaults = OpenAiConfig::default();
        Self {
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout_ms: defaults.timeout.as_millis() as u64,
            base_url: defaults.base_url,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn to_provider_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.timeout(),
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub enabled: bool,
    pub acceptable_score: f64,
    pub max_attempts: u32,
}

impl Default for QualitySettings {
    fn default() -> Self {
        let defaults = QualityConfig::default();
        Self {
            enabled: true,
            acceptable_score: defaults.acceptable_score,
            max_attempts: defaults.max_attempts,
        }
    }
}

impl QualitySettings {
    pub fn to_quality_config(&self) -> QualityConfig {
        QualityConfig::default()
            .with_acceptable_score(self.acceptable_score)
            .with_max_attempts(self.max_attempts)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub dir: PathBuf,
    pub conversation: String,
    pub evaluator: String,
    pub writing: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("prompts"),
            conversation: quill::agent::CONVERSATION_TEMPLATE.to_string(),
            evaluator: quill::agent::EVALUATOR_TEMPLATE.to_string(),
            writing: quill::agent::WRITING_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub dir: PathBuf,
    pub save: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("chatHistories"),
            save: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            quality: QualitySettings::default(),
            prompts: PromptsConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.quality.acceptable_score, 90.0);
        assert_eq!(config.quality.max_attempts, 3);
        assert!(config.quality.enabled);
        assert_eq!(config.prompts.conversation, "conversation");
        assert!(config.history.save);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quill.yml");
        fs::write(&path, "quality:\n  acceptable_score: 75\nllm:\n  model: gpt-4o-mini\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.quality.acceptable_score, 75.0);
        assert_eq!(config.quality.max_attempts, 3);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 3000);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.yml"))).is_err());
    }

    #[test]
    fn test_to_quality_config() {
        let settings = QualitySettings {
            enabled: true,
            acceptable_score: 0.0,
            max_attempts: 1,
        };
        let config = settings.to_quality_config();
        assert_eq!(config.acceptable_score, 0.0);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_to_provider_config() {
        let llm = LlmConfig {
            timeout_ms: 1500,
            ..LlmConfig::default()
        };
        assert_eq!(llm.to_provider_config().timeout, Duration::from_millis(1500));
    }
}
