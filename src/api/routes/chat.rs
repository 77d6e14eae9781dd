

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::core::generation::GenerationService;
use crate::infrastructure::error::{AppError, AppResult};

/// Requête de chat du mini-app
#[derive(Debug, Deserialize, Validate)]
pub struct ChatPayload {
    pub tg_id: i64,
    #[validate(length(min = 1, message = "Le texte est requis"))]
    pub text: String,
}

/// Endpoint de complétion de chat
#[post("/chat")]
pub async fn chat(
    payload: web::Json<ChatPayload>,
    generation: web::Data<GenerationService>,
) -> AppResult<HttpResponse> {
    payload.validate()?;
    if payload.tg_id <= 0 {
        return Err(AppError::BadRequest("tg_id requis".to_string()));
    }

    let answer = generation.chat(payload.tg_id, &payload.text).await?;

    Ok(HttpResponse::Ok().json(json!({ "ok": true, "answer": answer })))
}
