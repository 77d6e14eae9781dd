

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use crate::core::gate::CreditGate;
use crate::core::poll::{wait_for_output, PollConfig};
use crate::domain::job::JobKind;
use crate::infrastructure::error::{AppError, AppResult};
use crate::infrastructure::provider::{ApiFreeClient, ChatMessage};
use crate::utils::config::Config;

/// Modèles et budgets de polling par capacité
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub chat_model: String,
    pub image_model: String,
    pub video_model: String,
    pub image_poll: PollConfig,
    pub video_poll: PollConfig,
}

impl GenerationSettings {
    /// Construit les réglages depuis la configuration d'environnement
    pub fn from_config(config: &Config) -> Self {
        Self {
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
            image_poll: PollConfig::new(
                Duration::from_secs(config.image_poll_interval_seconds),
                config.image_poll_max_attempts,
            ),
            video_poll: PollConfig::new(
                Duration::from_secs(config.video_poll_interval_seconds),
                config.video_poll_max_attempts,
            ),
        }
    }
}

/// Requête de génération d'image
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageRequest {
    #[validate(length(min = 1, message = "Le prompt est requis"))]
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub num_images: Option<u32>,
}

impl ImageRequest {
    /// Requête minimale à partir d'un prompt (commandes du bot)
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            width: None,
            height: None,
            num_images: None,
        }
    }
}

/// Requête de génération de vidéo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VideoRequest {
    #[validate(length(min = 1, message = "Le prompt est requis"))]
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<u32>,
    pub fps: Option<u32>,
}

impl VideoRequest {
    /// Requête minimale à partir d'un prompt (commandes du bot)
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            width: None,
            height: None,
            duration: None,
            fps: None,
        }
    }
}

/// Orchestration des capacités payantes.
///
/// Pour chaque capacité: validation, garde-fou de crédits (refus sans
/// appel fournisseur), puis appel fournisseur, avec polling pour les
/// jobs asynchrones. Un échec fournisseur après le décrément ne
/// rembourse pas le crédit.
#[derive(Debug, Clone)]
pub struct GenerationService {
    client: Arc<ApiFreeClient>,
    gate: CreditGate,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(client: Arc<ApiFreeClient>, gate: CreditGate, settings: GenerationSettings) -> Self {
        Self {
            client,
            gate,
            settings,
        }
    }

    /// Vérifie le quota; `NoCredits` sans appel fournisseur en cas de refus
    async fn consume_or_reject(&self, tg_id: i64) -> AppResult<()> {
        if self.gate.try_consume(tg_id).await? {
            Ok(())
        } else {
            Err(AppError::NoCredits)
        }
    }

    /// Complétion de chat (appel synchrone, pas de polling)
    pub async fn chat(&self, tg_id: i64, text: &str) -> AppResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("text requis".to_string()));
        }

        self.consume_or_reject(tg_id).await?;
        self.client
            .chat(&self.settings.chat_model, &[ChatMessage::user(text)])
            .await
    }

    /// Soumet un job image; retourne la réponse brute du fournisseur
    pub async fn submit_image(&self, tg_id: i64, request: &ImageRequest) -> AppResult<Value> {
        check_prompt(&request.prompt)?;
        self.consume_or_reject(tg_id).await?;

        let payload = image_payload(&self.settings.image_model, request);
        let (request_id, raw) = self.client.submit(JobKind::Image, &payload).await?;
        info!("🖼️ Job image {} soumis pour l'utilisateur {}", request_id, tg_id);
        Ok(raw)
    }

    /// Résultat brut d'un job image (pas de garde-fou: déjà payé au submit)
    pub async fn image_result(&self, request_id: &str) -> AppResult<Value> {
        self.client.result(JobKind::Image, request_id).await
    }

    /// Génération d'image complète: submit puis polling jusqu'à l'URL finale
    pub async fn generate_image(&self, tg_id: i64, request: &ImageRequest) -> AppResult<String> {
        check_prompt(&request.prompt)?;
        self.consume_or_reject(tg_id).await?;

        let payload = image_payload(&self.settings.image_model, request);
        let (request_id, _) = self.client.submit(JobKind::Image, &payload).await?;
        wait_for_output(
            &self.client,
            JobKind::Image,
            &request_id,
            &self.settings.image_poll,
        )
        .await
    }

    /// Soumet un job vidéo; retourne la réponse brute du fournisseur
    pub async fn submit_video(&self, tg_id: i64, request: &VideoRequest) -> AppResult<Value> {
        check_prompt(&request.prompt)?;
        self.consume_or_reject(tg_id).await?;

        let payload = video_payload(&self.settings.video_model, request);
        let (request_id, raw) = self.client.submit(JobKind::Video, &payload).await?;
        info!("🎬 Job vidéo {} soumis pour l'utilisateur {}", request_id, tg_id);
        Ok(raw)
    }

    /// Résultat brut d'un job vidéo
    pub async fn video_result(&self, request_id: &str) -> AppResult<Value> {
        self.client.result(JobKind::Video, request_id).await
    }

    /// Génération de vidéo complète: submit puis polling jusqu'à l'URL finale
    pub async fn generate_video(&self, tg_id: i64, request: &VideoRequest) -> AppResult<String> {
        check_prompt(&request.prompt)?;
        self.consume_or_reject(tg_id).await?;

        let payload = video_payload(&self.settings.video_model, request);
        let (request_id, _) = self.client.submit(JobKind::Video, &payload).await?;
        wait_for_output(
            &self.client,
            JobKind::Video,
            &request_id,
            &self.settings.video_poll,
        )
        .await
    }
}

/// Le prompt doit rester non vide après trim
fn check_prompt(prompt: &str) -> AppResult<()> {
    if prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt requis".to_string()));
    }
    Ok(())
}

/// Corps de submit image au format fournisseur
fn image_payload(model: &str, request: &ImageRequest) -> Value {
    let mut payload = json!({
        "model": model,
        "prompt": request.prompt,
        "num_images": request.num_images.unwrap_or(1),
    });
    if let Some(negative_prompt) = &request.negative_prompt {
        payload["negative_prompt"] = json!(negative_prompt);
    }
    if let Some(width) = request.width {
        payload["width"] = json!(width);
    }
    if let Some(height) = request.height {
        payload["height"] = json!(height);
    }
    payload
}

/// Corps de submit vidéo au format fournisseur
fn video_payload(model: &str, request: &VideoRequest) -> Value {
    let mut payload = json!({
        "model": model,
        "prompt": request.prompt,
    });
    if let Some(negative_prompt) = &request.negative_prompt {
        payload["negative_prompt"] = json!(negative_prompt);
    }
    if let Some(width) = request.width {
        payload["width"] = json!(width);
    }
    if let Some(height) = request.height {
        payload["height"] = json!(height);
    }
    if let Some(duration) = request.duration {
        payload["duration"] = json!(duration);
    }
    if let Some(fps) = request.fps {
        payload["fps"] = json!(fps);
    }
    payload
}
