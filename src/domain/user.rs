

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Utilisateur du bot, créé au premier contact.
///
/// Le solde de crédits est tenu par palier: les crédits gratuits sont
/// distribués à l'inscription, les crédits pro via les achats.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub tg_id: i64,
    pub credits_free: i64,
    pub credits_pro: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Nombre total de crédits restants, tous paliers confondus
    pub fn credits_total(&self) -> i64 {
        self.credits_free + self.credits_pro
    }
}

/// Palier de crédits consommable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditTier {
    Free,
    Pro,
}

impl CreditTier {
    /// Colonne SQL portant le solde de ce palier
    pub(crate) fn column(&self) -> &'static str {
        match self {
            CreditTier::Free => "credits_free",
            CreditTier::Pro => "credits_pro",
        }
    }
}
