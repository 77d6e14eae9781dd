

use actix_web::{post, web, HttpResponse};
use serde_json::{json, Value};
use tracing::error;

use crate::core::bot;
use crate::core::generation::GenerationService;
use crate::infrastructure::error::{AppError, AppResult};
use crate::infrastructure::storage::Storage;
use crate::infrastructure::telegram::TelegramApi;
use crate::utils::config::Config;

/// Webhook Telegram: valide le secret d'URL puis délègue le traitement de
/// l'update au bot.
///
/// Telegram relivre les updates en cas de réponse non-2xx; on répond donc
/// toujours `{"ok": true}` une fois le secret validé, et les échecs de
/// traitement sont seulement loggés.
#[post("/telegram/webhook/{secret}")]
pub async fn telegram_webhook(
    path: web::Path<String>,
    update: web::Json<Value>,
    config: web::Data<Config>,
    storage: web::Data<Storage>,
    telegram: web::Data<TelegramApi>,
    generation: web::Data<GenerationService>,
) -> AppResult<HttpResponse> {
    if path.into_inner() != config.webhook_secret {
        return Err(AppError::NotFound("Route".to_string()));
    }

    if let Err(e) = bot::handle_update(&config, &storage, &telegram, &generation, &update).await {
        error!("❌ handle_update: {}", e);
    }

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}
