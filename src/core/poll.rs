

use std::time::Duration;

use tracing::debug;

use crate::domain::job::{JobKind, JobStatus};
use crate::infrastructure::error::{AppError, AppResult};
use crate::infrastructure::provider::{normalize_result, ApiFreeClient};

/// Paramètres de polling d'un job asynchrone.
///
/// L'intervalle et le budget de tentatives sont de la configuration
/// explicite, pas des constantes enfouies dans la boucle.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Intervalle entre deux interrogations
    pub interval: Duration,
    /// Nombre maximum d'interrogations avant abandon
    pub max_attempts: u32,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Interroge le fournisseur jusqu'à un statut terminal ou épuisement du
/// budget de tentatives.
///
/// La boucle vit entièrement dans le traitement de la requête appelante:
/// pas d'annulation externe, suspension (`tokio::time::sleep`) entre deux
/// tentatives pour laisser passer les autres requêtes.
///
/// - Success retourne l'URL de sortie normalisée.
/// - Failed remonte `AppError::Provider` avec la réponse brute.
/// - Budget épuisé remonte `AppError::PollTimeout`.
pub async fn wait_for_output(
    client: &ApiFreeClient,
    kind: JobKind,
    request_id: &str,
    config: &PollConfig,
) -> AppResult<String> {
    for attempt in 1..=config.max_attempts {
        let raw = client.result(kind, request_id).await?;
        let update = normalize_result(kind, &raw)?;

        match update.status {
            JobStatus::Success => {
                // normalize_result garantit une sortie sur un Success
                return update.output.ok_or_else(|| {
                    AppError::Provider(format!("{} result without output: {}", kind, raw))
                });
            }
            JobStatus::Failed => {
                return Err(AppError::Provider(format!(
                    "{} job {} failed: {}",
                    kind, request_id, raw
                )));
            }
            JobStatus::Pending => {
                debug!(
                    "⏳ Job {} {} en attente (tentative {}/{})",
                    kind, request_id, attempt, config.max_attempts
                );
            }
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    Err(AppError::PollTimeout(format!(
        "{} job {} still pending after {} attempts",
        kind, request_id, config.max_attempts
    )))
}
