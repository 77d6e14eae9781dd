

use serde_json::Value;
use tracing::{info, warn};

use crate::core::generation::{GenerationService, ImageRequest, VideoRequest};
use crate::infrastructure::error::{AppError, AppResult};
use crate::infrastructure::storage::Storage;
use crate::infrastructure::telegram::TelegramApi;
use crate::utils::config::Config;

/// Traite un update Telegram entrant.
///
/// L'update reste du JSON opaque: seuls `message.chat.id`, `message.from.id`
/// et `message.text` sont lus. Les échecs de génération sont expliqués à
/// l'utilisateur via sendMessage; le webhook, lui, répond toujours ok.
pub async fn handle_update(
    config: &Config,
    storage: &Storage,
    telegram: &TelegramApi,
    generation: &GenerationService,
    update: &Value,
) -> AppResult<()> {
    // Messages édités, callbacks, inline queries: ignorés
    let Some(message) = update.get("message") else {
        return Ok(());
    };

    let Some(chat_id) = message.pointer("/chat/id").and_then(Value::as_i64) else {
        return Ok(());
    };
    let tg_id = message
        .pointer("/from/id")
        .and_then(Value::as_i64)
        .unwrap_or(chat_id);

    let text = message
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return Ok(());
    }

    // Création au premier contact, avec la dotation de crédits gratuits
    let user = storage
        .ensure_user(tg_id, config.free_credits_on_join)
        .await?;

    if text == "/start" {
        info!("👋 Nouveau contact: utilisateur {}", tg_id);
        let welcome = format!(
            "Bienvenue ! Tu disposes de {} crédit(s).\n\
             Commandes: /image <description>, /video <description>, /credits — \
             ou envoie simplement un message pour discuter.",
            user.credits_total()
        );
        return telegram.send_message(chat_id, &welcome).await;
    }

    if text == "/credits" {
        let balance = format!(
            "Crédits restants — gratuits: {}, pro: {}",
            user.credits_free, user.credits_pro
        );
        return telegram.send_message(chat_id, &balance).await;
    }

    if let Some(prompt) = command_argument(text, "/image") {
        if prompt.is_empty() {
            return telegram
                .send_message(chat_id, "Utilisation: /image <description>")
                .await;
        }
        return match generation
            .generate_image(tg_id, &ImageRequest::from_prompt(prompt))
            .await
        {
            Ok(url) => telegram.send_photo(chat_id, &url, Some(prompt)).await,
            Err(error) => report_failure(telegram, chat_id, tg_id, "image", error).await,
        };
    }

    if let Some(prompt) = command_argument(text, "/video") {
        if prompt.is_empty() {
            return telegram
                .send_message(chat_id, "Utilisation: /video <description>")
                .await;
        }
        return match generation
            .generate_video(tg_id, &VideoRequest::from_prompt(prompt))
            .await
        {
            Ok(url) => telegram.send_video(chat_id, &url, Some(prompt)).await,
            Err(error) => report_failure(telegram, chat_id, tg_id, "video", error).await,
        };
    }

    // Texte libre: complétion de chat
    match generation.chat(tg_id, text).await {
        Ok(answer) => telegram.send_message(chat_id, &answer).await,
        Err(error) => report_failure(telegram, chat_id, tg_id, "chat", error).await,
    }
}

/// Argument d'une commande `/cmd <argument>`.
///
/// `/image un chat` -> Some("un chat"), `/image` -> Some(""),
/// `/imaginaire` -> None (le préfixe seul ne suffit pas).
fn command_argument<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    match text.strip_prefix(command) {
        Some("") => Some(""),
        Some(rest) if rest.starts_with(' ') => Some(rest.trim()),
        _ => None,
    }
}

/// Explique un échec à l'utilisateur et le logge côté serveur
async fn report_failure(
    telegram: &TelegramApi,
    chat_id: i64,
    tg_id: i64,
    capability: &str,
    error: AppError,
) -> AppResult<()> {
    let user_message = match &error {
        AppError::NoCredits => {
            "Plus de crédits disponibles. Reviens plus tard ou passe au plan pro.".to_string()
        }
        AppError::PollTimeout(_) => {
            "La génération prend plus de temps que prévu, réessaie dans un instant.".to_string()
        }
        AppError::Provider(_) => {
            "Le service de génération a renvoyé une erreur, réessaie plus tard.".to_string()
        }
        other => format!("Erreur inattendue ({})", other.error_code()),
    };

    warn!("⚠️ Échec {} pour l'utilisateur {}: {}", capability, tg_id, error);
    telegram.send_message(chat_id, &user_message).await
}
