//! Normalisation des réponses ApiFree.
//!
//! Le fournisseur expose plusieurs formes de réponse selon l'endpoint et la
//! génération d'API; chaque forme acceptée est listée explicitement ici.
//! Une forme inconnue échoue avec `AppError::Provider` (réponse brute en
//! détail) plutôt que de retourner silencieusement un résultat vide.

use serde_json::Value;

use crate::domain::job::{JobKind, JobStatus, JobUpdate};
use crate::infrastructure::error::{AppError, AppResult};

/// Extrait l'identifiant de tâche d'une réponse de submit.
///
/// Formes acceptées:
/// - `{"code": 200, "resp_data": {"request_id": "..."}}`
/// - `{"request_id": "..."}`, `{"task_id": "..."}` ou `{"id": "..."}`
///
/// Un champ `code` différent de 200 est une erreur applicative du
/// fournisseur, même sous HTTP 200.
pub fn extract_request_id(body: &Value) -> AppResult<String> {
    if let Some(code) = body.get("code").and_then(Value::as_i64) {
        if code != 200 {
            return Err(AppError::Provider(format!("submit rejected: {}", body)));
        }
    }

    let candidate = body
        .pointer("/resp_data/request_id")
        .or_else(|| body.get("request_id"))
        .or_else(|| body.get("task_id"))
        .or_else(|| body.get("id"));

    match candidate {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(AppError::Provider(format!(
            "submit response without task id: {}",
            body
        ))),
    }
}

/// Normalise une réponse de résultat en statut + sortie éventuelle.
///
/// Statut lu dans `resp_data.status`, `status` ou `state`; un champ absent
/// vaut Pending. La sortie d'un statut Success est lue (dans cet ordre)
/// dans `resp_data.image_list[0]` / `resp_data.video_list[0]`,
/// `output.url`, `url`, `result.url`; un Success sans URL exploitable
/// échoue avec `AppError::Provider`.
pub fn normalize_result(kind: JobKind, body: &Value) -> AppResult<JobUpdate> {
    let raw_status = body
        .pointer("/resp_data/status")
        .or_else(|| body.get("status"))
        .or_else(|| body.get("state"))
        .and_then(Value::as_str)
        .unwrap_or("");

    let status = JobStatus::from_provider(raw_status);

    let output = match status {
        JobStatus::Success => Some(extract_output(kind, body)?),
        _ => None,
    };

    Ok(JobUpdate { status, output })
}

/// Extrait l'URL de sortie d'un résultat terminal Success
fn extract_output(kind: JobKind, body: &Value) -> AppResult<String> {
    let candidates = [
        body.pointer(&format!("/resp_data/{}/0", kind.list_field())),
        body.pointer("/output/url"),
        body.get("url"),
        body.pointer("/result/url"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(as_url)
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Provider(format!("{} result done but no output url: {}", kind, body))
        })
}

/// Une entrée de liste peut être l'URL elle-même ou un objet `{"url": ...}`
fn as_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(url) if !url.is_empty() => Some(url),
        Value::Object(_) => value.get("url").and_then(Value::as_str),
        _ => None,
    }
}
