// utils/config.rs
use std::collections::HashSet;
use std::env;
use std::time::Duration;

use dotenv::dotenv;
use serde::Deserialize;

use crate::infrastructure::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Environnement et serveur
    pub run_mode: String,
    pub server_host: String,
    pub server_port: u16,
    pub workers: usize,

    // Base de données
    pub db_path: String,

    // Fournisseur d'inférence
    pub provider_base_url: String,
    pub provider_api_key: String,
    pub provider_timeout_seconds: u64,
    pub chat_model: String,
    pub image_model: String,
    pub video_model: String,

    // Polling des jobs asynchrones
    pub image_poll_interval_seconds: u64,
    pub image_poll_max_attempts: u32,
    pub video_poll_interval_seconds: u64,
    pub video_poll_max_attempts: u32,

    // Telegram
    pub bot_token: String,
    pub webhook_secret: String,
    pub public_base_url: String,

    // Crédits
    pub admin_ids: Vec<i64>,
    pub free_credits_on_join: i64,

    // Mini-app
    pub webapp_dir: String,
}

impl Config {
    /// Charger la configuration depuis les variables d'environnement
    pub fn from_env() -> AppResult<Self> {
        // Charger le fichier .env si présent
        let _ = dotenv().ok();

        // Variables requises
        let required_vars = [
            "PROVIDER_API_KEY",
            "PROVIDER_BASE_URL",
            "BOT_TOKEN",
            "WEBHOOK_SECRET",
            "PUBLIC_BASE_URL",
        ];

        for var in &required_vars {
            if env::var(var).is_err() {
                return Err(AppError::Configuration(format!(
                    "Variable d'environnement requise manquante: {}",
                    var
                )));
            }
        }

        let config = Config {
            // Environnement et serveur
            run_mode: env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| AppError::Configuration("SERVER_PORT must be a number".to_string()))?,
            workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .map_err(|_| AppError::Configuration("WORKERS must be a number".to_string()))?,

            // Base de données
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "./data/bot.db".to_string()),

            // Fournisseur d'inférence
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .map_err(|_| AppError::Configuration("PROVIDER_BASE_URL is required".to_string()))?,
            provider_api_key: env::var("PROVIDER_API_KEY")
                .map_err(|_| AppError::Configuration("PROVIDER_API_KEY is required".to_string()))?,
            provider_timeout_seconds: env::var("PROVIDER_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("PROVIDER_TIMEOUT_SECONDS must be a number".to_string())
                })?,
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "openai/gpt-5.2".to_string()),
            image_model: env::var("IMAGE_MODEL")
                .unwrap_or_else(|_| "google/nano-banana-pro".to_string()),
            video_model: env::var("VIDEO_MODEL")
                .unwrap_or_else(|_| "klingai/kling-v2.6/pro".to_string()),

            // Polling des jobs asynchrones
            image_poll_interval_seconds: env::var("IMAGE_POLL_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration(
                        "IMAGE_POLL_INTERVAL_SECONDS must be a number".to_string(),
                    )
                })?,
            image_poll_max_attempts: env::var("IMAGE_POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("IMAGE_POLL_MAX_ATTEMPTS must be a number".to_string())
                })?,
            video_poll_interval_seconds: env::var("VIDEO_POLL_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration(
                        "VIDEO_POLL_INTERVAL_SECONDS must be a number".to_string(),
                    )
                })?,
            video_poll_max_attempts: env::var("VIDEO_POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("VIDEO_POLL_MAX_ATTEMPTS must be a number".to_string())
                })?,

            // Telegram
            bot_token: env::var("BOT_TOKEN")
                .map_err(|_| AppError::Configuration("BOT_TOKEN is required".to_string()))?,
            webhook_secret: env::var("WEBHOOK_SECRET")
                .map_err(|_| AppError::Configuration("WEBHOOK_SECRET is required".to_string()))?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map_err(|_| AppError::Configuration("PUBLIC_BASE_URL is required".to_string()))?,

            // Crédits
            admin_ids: parse_admin_ids(&env::var("ADMIN_IDS").unwrap_or_default())?,
            free_credits_on_join: env::var("FREE_CREDITS_ON_JOIN")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("FREE_CREDITS_ON_JOIN must be a number".to_string())
                })?,

            // Mini-app
            webapp_dir: env::var("WEBAPP_DIR").unwrap_or_else(|_| "./webapp".to_string()),
        };

        Ok(config)
    }

    /// Vérifier si on est en production
    pub fn is_production(&self) -> bool {
        self.run_mode == "production"
    }

    /// Timeout des appels sortants vers le fournisseur
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_seconds)
    }

    /// Ensemble des identifiants admin exemptés de crédits
    pub fn admin_id_set(&self) -> HashSet<i64> {
        self.admin_ids.iter().copied().collect()
    }

    /// URL complète du webhook Telegram à enregistrer
    pub fn webhook_url(&self) -> String {
        format!(
            "{}/telegram/webhook/{}",
            self.public_base_url.trim_end_matches('/'),
            self.webhook_secret
        )
    }
}

/// Parse la liste d'identifiants admin (séparés par des virgules)
fn parse_admin_ids(raw: &str) -> AppResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>().map_err(|_| {
                AppError::Configuration(format!("ADMIN_IDS: identifiant invalide '{}'", part))
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        run_mode: "test".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 8080,
        workers: 1,
        db_path: ":memory:".to_string(),
        provider_base_url: "http://localhost:0".to_string(),
        provider_api_key: "test-key".to_string(),
        provider_timeout_seconds: 5,
        chat_model: "test/chat".to_string(),
        image_model: "test/image".to_string(),
        video_model: "test/video".to_string(),
        image_poll_interval_seconds: 0,
        image_poll_max_attempts: 5,
        video_poll_interval_seconds: 0,
        video_poll_max_attempts: 5,
        bot_token: "123:test".to_string(),
        webhook_secret: "sekret".to_string(),
        public_base_url: "http://localhost:8080".to_string(),
        admin_ids: Vec::new(),
        free_credits_on_join: 3,
        webapp_dir: "./webapp".to_string(),
    }
}
