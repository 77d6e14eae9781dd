

mod normalize;

pub use normalize::{extract_request_id, normalize_result};

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::job::JobKind;
use crate::infrastructure::error::{AppError, AppResult};

/// Message de conversation au format OpenAI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Client HTTP du fournisseur d'inférence ApiFree.
///
/// Trois opérations: submit d'un job de génération, lecture d'un résultat
/// de job, complétion de chat synchrone. Timeout borné sur chaque appel,
/// aucun retry: un échec remonte immédiatement à l'appelant.
#[derive(Debug, Clone)]
pub struct ApiFreeClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl ApiFreeClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Complétion de chat synchrone (endpoint compatible OpenAI)
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> AppResult<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let payload = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": 0.7,
        });

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "chat/completions HTTP {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|_| {
            AppError::Provider(format!("chat/completions malformed body: {}", body))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Provider(format!("chat/completions empty choices: {}", body)))
    }

    /// Soumet un job de génération.
    ///
    /// Retourne l'identifiant de tâche normalisé et la réponse brute du
    /// fournisseur (exposée telle quelle au mini-app).
    pub async fn submit(&self, kind: JobKind, payload: &Value) -> AppResult<(String, Value)> {
        let url = format!("{}/v1/{}/submit", self.base_url, kind.as_str());

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "{} submit HTTP {}: {}",
                kind, status, body
            )));
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|_| AppError::Provider(format!("{} submit non-JSON body: {}", kind, body)))?;

        let request_id = normalize::extract_request_id(&raw)?;
        debug!("📤 Job {} soumis: {}", kind, request_id);

        Ok((request_id, raw))
    }

    /// État courant d'un job (réponse brute, non normalisée)
    pub async fn result(&self, kind: JobKind, request_id: &str) -> AppResult<Value> {
        let url = format!(
            "{}/v1/{}/{}/result",
            self.base_url,
            kind.as_str(),
            request_id
        );

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "{} result HTTP {}: {}",
                kind, status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|_| AppError::Provider(format!("{} result non-JSON body: {}", kind, body)))
    }
}

// Structures pour l'endpoint chat/completions
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
