

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use tracing::debug;

use crate::infrastructure::error::{AppError, AppResult};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Client pour l'API Bot Telegram.
///
/// Le contenu des updates entrants reste du JSON opaque pour le coeur;
/// ce client ne couvre que les appels sortants utilisés par le bot.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    http: HttpClient,
    base_url: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str) -> AppResult<Self> {
        Self::with_base_url(TELEGRAM_API_BASE, bot_token)
    }

    /// Base alternative (tests)
    pub fn with_base_url(base: &str, bot_token: &str) -> AppResult<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", base.trim_end_matches('/'), bot_token),
        })
    }

    /// Appelle une méthode de l'API Bot et vérifie le flag `ok`
    async fn call(&self, api_method: &str, payload: &Value) -> AppResult<()> {
        let url = format!("{}/{}", self.base_url, api_method);

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Telegram(e.to_string()))?;

        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !status.is_success() || !ok {
            return Err(AppError::Telegram(format!(
                "{} failed (HTTP {}): {}",
                api_method, status, body
            )));
        }

        debug!("📨 Telegram {} ok", api_method);
        Ok(())
    }

    /// Enregistre l'URL de webhook auprès de Telegram
    pub async fn set_webhook(&self, url: &str) -> AppResult<()> {
        self.call("setWebhook", &json!({ "url": url })).await
    }

    /// Envoie un message texte dans un chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        self.call("sendMessage", &json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    /// Envoie une photo par URL
    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> AppResult<()> {
        let mut payload = json!({ "chat_id": chat_id, "photo": photo_url });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
        }
        self.call("sendPhoto", &payload).await
    }

    /// Envoie une vidéo par URL
    pub async fn send_video(
        &self,
        chat_id: i64,
        video_url: &str,
        caption: Option<&str>,
    ) -> AppResult<()> {
        let mut payload = json!({ "chat_id": chat_id, "video": video_url });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
        }
        self.call("sendVideo", &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn send_message_posts_to_bot_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:test/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 5, "text": "salut"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = TelegramApi::with_base_url(&server.uri(), "123:test").unwrap();
        api.send_message(5, "salut").await.unwrap();
    }

    #[tokio::test]
    async fn api_level_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:test/setWebhook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "description": "bad webhook url"
            })))
            .mount(&server)
            .await;

        let api = TelegramApi::with_base_url(&server.uri(), "123:test").unwrap();
        let error = api.set_webhook("not-a-url").await.unwrap_err();
        assert!(matches!(error, AppError::Telegram(_)));
    }
}
