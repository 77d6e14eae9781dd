

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type de job asynchrone soumis au fournisseur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Image,
    Video,
}

impl JobKind {
    /// Segment d'URL du fournisseur pour ce type de job
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Image => "image",
            JobKind::Video => "video",
        }
    }

    /// Champ liste du résultat terminal (`image_list` / `video_list`)
    pub(crate) fn list_field(&self) -> &'static str {
        match self {
            JobKind::Image => "image_list",
            JobKind::Video => "video_list",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statut normalisé d'un job côté fournisseur.
///
/// Machine à états du polling: Pending -> {Pending, Success, Failed}.
/// L'épuisement du budget de tentatives est porté par `AppError::PollTimeout`,
/// pas par un statut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
}

impl JobStatus {
    /// Normalise un statut fournisseur (insensible à la casse).
    /// Toute valeur inconnue reste Pending.
    pub fn from_provider(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "succeeded" | "done" | "success" | "completed" => JobStatus::Success,
            "failed" | "error" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    /// Vrai si le polling doit s'arrêter sur ce statut
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Instantané normalisé d'un job lors d'un poll
#[derive(Debug, Clone)]
pub struct JobUpdate {
    pub status: JobStatus,
    /// URL de sortie, présente uniquement sur un statut Success
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_aliases_normalize_case_insensitively() {
        for raw in ["succeeded", "done", "success", "completed", "SUCCEEDED", "Done"] {
            assert_eq!(JobStatus::from_provider(raw), JobStatus::Success, "{raw}");
        }
    }

    #[test]
    fn failure_aliases_normalize() {
        for raw in ["failed", "error", "FAILED", "Error"] {
            assert_eq!(JobStatus::from_provider(raw), JobStatus::Failed, "{raw}");
        }
    }

    #[test]
    fn unknown_statuses_stay_pending() {
        for raw in ["pending", "queued", "running", "", "in_progress", "whatever"] {
            assert_eq!(JobStatus::from_provider(raw), JobStatus::Pending, "{raw}");
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Success.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }
}
