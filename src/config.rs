use std::env;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Default OpenAI-compatible API root (Groq).
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default chat model used for financial summaries.
pub const DEFAULT_LLM_MODEL: &str = "llama3-70b-8192";
/// Default sampling temperature for summary generation.
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
/// Default Tesseract executable, resolved through `PATH`.
pub const DEFAULT_TESSERACT_PATH: &str = "tesseract";
/// Default Tesseract language pack.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the analysis server.
#[derive(Clone)]
pub struct Config {
    /// Bearer credential for the hosted language model.
    pub llm_api_key: String,
    /// Root of the OpenAI-compatible API (without the `/chat/completions` suffix).
    pub llm_base_url: String,
    /// Chat model identifier passed to the provider.
    pub llm_model: String,
    /// Sampling temperature passed to the provider.
    pub llm_temperature: f32,
    /// Tesseract executable used for image OCR.
    pub tesseract_path: String,
    /// Tesseract language pack (`-l` argument).
    pub ocr_language: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Origins allowed by the CORS layer; empty allows any origin.
    pub cors_allowed_origins: Vec<String>,
    /// Log file appended to alongside stdout; `None` writes to `logs/finsight.log`.
    pub log_file: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("llm_api_key", &"<redacted>")
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("tesseract_path", &self.tesseract_path)
            .field("ocr_language", &self.ocr_language)
            .field("server_port", &self.server_port)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let llm_temperature = match get("LLM_TEMPERATURE") {
            Some(value) => value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or_else(|| ConfigError::InvalidValue("LLM_TEMPERATURE".into()))?,
            None => DEFAULT_LLM_TEMPERATURE,
        };

        Ok(Self {
            llm_api_key: get("LLM_API_KEY")
                .ok_or_else(|| ConfigError::MissingVariable("LLM_API_KEY".to_string()))?,
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            llm_temperature,
            tesseract_path: get("TESSERACT_PATH")
                .unwrap_or_else(|| DEFAULT_TESSERACT_PATH.to_string()),
            ocr_language: get("OCR_LANGUAGE").unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.to_string()),
            server_port: get("SERVER_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            log_file: get("FINSIGHT_LOG_FILE").map(|value| value.trim().to_string()),
        })
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Keep `config` for the process lifetime. The first installed value wins.
fn install(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

/// Load configuration from the environment (and `.env`) and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        llm_base_url = %config.llm_base_url,
        llm_model = %config.llm_model,
        tesseract_path = %config.tesseract_path,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(install(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_api_key_is_set() {
        let config = load(&[("LLM_API_KEY", "secret")]).expect("config");

        assert_eq!(config.llm_api_key, "secret");
        assert_eq!(config.llm_base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(config.llm_temperature, DEFAULT_LLM_TEMPERATURE);
        assert_eq!(config.tesseract_path, "tesseract");
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.server_port, None);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let error = load(&[("LLM_MODEL", "llama")]).expect_err("missing key");
        assert!(matches!(error, ConfigError::MissingVariable(name) if name == "LLM_API_KEY"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let error = load(&[("LLM_API_KEY", "   ")]).expect_err("blank key");
        assert!(matches!(error, ConfigError::MissingVariable(_)));

        let config = load(&[
            ("LLM_API_KEY", "k"),
            ("TESSERACT_PATH", ""),
            ("FINSIGHT_LOG_FILE", "  "),
        ])
        .expect("config");
        assert_eq!(config.tesseract_path, DEFAULT_TESSERACT_PATH);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("LLM_API_KEY", "k"),
            ("LLM_BASE_URL", "http://localhost:9000/v1"),
            ("LLM_MODEL", "mixtral"),
            ("LLM_TEMPERATURE", "0.2"),
            ("TESSERACT_PATH", "/opt/ocr/bin/tesseract"),
            ("OCR_LANGUAGE", "deu"),
            ("SERVER_PORT", "8123"),
            ("FINSIGHT_LOG_FILE", " /var/log/finsight/server.log "),
            (
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:5173, https://app.example.org,",
            ),
        ])
        .expect("config");

        assert_eq!(config.llm_base_url, "http://localhost:9000/v1");
        assert_eq!(config.llm_model, "mixtral");
        assert!((config.llm_temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.tesseract_path, "/opt/ocr/bin/tesseract");
        assert_eq!(config.ocr_language, "deu");
        assert_eq!(config.server_port, Some(8123));
        assert_eq!(config.log_file.as_deref(), Some("/var/log/finsight/server.log"));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:5173", "https://app.example.org"]
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let error = load(&[("LLM_API_KEY", "k"), ("SERVER_PORT", "eighty")]).expect_err("port");
        assert!(matches!(error, ConfigError::InvalidValue(name) if name == "SERVER_PORT"));

        let error =
            load(&[("LLM_API_KEY", "k"), ("LLM_TEMPERATURE", "3.5")]).expect_err("temperature");
        assert!(matches!(error, ConfigError::InvalidValue(name) if name == "LLM_TEMPERATURE"));
    }

    #[test]
    fn first_installed_config_is_kept() {
        let first = install(load(&[("LLM_API_KEY", "first")]).expect("config"));
        let second = install(load(&[("LLM_API_KEY", "second")]).expect("config"));

        assert!(std::ptr::eq(first, second));
        assert_eq!(second.llm_api_key, first.llm_api_key);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = load(&[("LLM_API_KEY", "gsk_very_secret")]).expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("gsk_very_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
