use anyhow::Result;
use std::env;

use crate::engine::EngineConfig;
use crate::models::{Rounding, RoundingDirection};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    /// Percentage of 1RM a training max defaults to.
    pub training_max_percent: f64,
    /// Default barbell rounding increment in pounds.
    pub rounding_increment: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let training_max_percent = env::var("TRAINING_MAX_PERCENT")
            .unwrap_or_else(|_| "90".to_string())
            .parse()
            .unwrap_or(90.0);
        let rounding_increment = env::var("ROUNDING_INCREMENT")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5.0);

        Ok(AppConfig {
            host,
            port,
            environment,
            log_level,
            training_max_percent,
            rounding_increment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Engine defaults built from the loaded configuration; nothing in the
    /// engine reads the environment directly.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            training_max_percent: self.training_max_percent,
            default_rounding: Rounding {
                increment: self.rounding_increment,
                direction: RoundingDirection::Nearest,
            },
            ..EngineConfig::default()
        }
    }
}
