//! Configuration management for the clinical notes server

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ocr: OcrConfig,
    pub formatter: FormatterConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin for the web frontend; `None` allows any origin
    pub frontend_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Ollama API base URL
    pub ollama_url: String,
    /// Ollama vision model name
    pub ollama_model: String,
    /// OCR language hint (ISO 639-2 code, as tesseract expects)
    pub language: String,
}

/// External text-cleanup service (Perplexity-compatible chat completions)
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// API key; formatting is skipped entirely when unset
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                frontend_origin: None,
            },
            database: DatabaseConfig {
                url: "sqlite:./clinical_notes.db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
            },
            ocr: OcrConfig {
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
                language: "eng".to_string(),
            },
            formatter: FormatterConfig {
                api_key: None,
                base_url: "https://api.perplexity.ai".to_string(),
                model: "sonar".to_string(),
                max_tokens: 1000,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                frontend_origin: env::var("FRONTEND_ORIGIN").ok(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")?,
            },
            ocr: OcrConfig {
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
            },
            formatter: FormatterConfig {
                api_key: env::var("PERPLEXITY_API_KEY").ok(),
                base_url: env::var("FORMATTER_BASE_URL").unwrap_or(defaults.formatter.base_url),
                model: env::var("FORMATTER_MODEL").unwrap_or(defaults.formatter.model),
                max_tokens: defaults.formatter.max_tokens,
            },
        })
    }
}
