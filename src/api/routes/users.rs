

use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::infrastructure::error::{AppError, AppResult};
use crate::infrastructure::storage::Storage;

/// Paramètres de lecture de profil
#[derive(Debug, Deserialize)]
pub struct MeParams {
    pub tg_id: i64,
}

/// Profil et solde de crédits pour le mini-app
#[get("/me")]
pub async fn me(
    query: web::Query<MeParams>,
    storage: web::Data<Storage>,
) -> AppResult<HttpResponse> {
    let user = storage
        .get_user(query.tg_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Utilisateur".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "tg_id": user.tg_id,
        "credits_free": user.credits_free,
        "credits_pro": user.credits_pro,
    })))
}
