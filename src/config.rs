use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Side length of the square input the network was trained on.
pub const INPUT_SIZE: u32 = 224;

/// Class labels in the order of the model's output vector.
pub const CLASS_LABELS: [&str; 5] = ["M", "N", "Q", "S", "V"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    pub model_path: PathBuf,
    pub bind_address: SocketAddr,
    pub workers: Option<usize>,
    /// Filter directives used when `RUST_LOG` is unset
    pub log_level: String,
}

impl ApiConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(lookup("ENVIRONMENT"));

        let model_path = lookup("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("2d_cnn.onnx"));

        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string());
        let bind_address = bind_address
            .parse()
            .with_context(|| format!("BIND_ADDRESS `{bind_address}` is not a socket address"))?;

        let workers = lookup("WORKERS")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0);

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            environment,
            model_path,
            bind_address,
            workers,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<ApiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.model_path, PathBuf::from("2d_cnn.onnx"));
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8000");
        assert_eq!(config.workers, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("ENVIRONMENT", "PROD"),
            ("MODEL_PATH", "/models/ecg.onnx"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("WORKERS", "4"),
            ("LOG_LEVEL", "ecg_model_api=debug,actix_web=warn"),
        ])
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.model_path, PathBuf::from("/models/ecg.onnx"));
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.log_level, "ecg_model_api=debug,actix_web=warn");
    }

    #[test]
    fn bad_worker_count_falls_back() {
        assert_eq!(config_from(&[("WORKERS", "many")]).unwrap().workers, None);
        assert_eq!(config_from(&[("WORKERS", "0")]).unwrap().workers, None);
    }

    #[test]
    fn rejects_unparseable_bind_address() {
        let err = config_from(&[("BIND_ADDRESS", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("BIND_ADDRESS"));
    }

    #[test]
    fn label_set_is_fixed() {
        assert_eq!(CLASS_LABELS, ["M", "N", "Q", "S", "V"]);
        assert_eq!(Environment::Production.as_str(), "production");
    }
}
