

use std::collections::HashSet;

use tracing::debug;

use crate::domain::user::CreditTier;
use crate::infrastructure::error::AppResult;
use crate::infrastructure::storage::Storage;

/// Garde-fou de crédits appliqué avant chaque capacité payante.
///
/// La vérification et le décrément forment une unité atomique côté
/// stockage; les identifiants admin configurés court-circuitent la
/// consommation sans toucher au solde.
#[derive(Debug, Clone)]
pub struct CreditGate {
    storage: Storage,
    admin_ids: HashSet<i64>,
}

impl CreditGate {
    pub fn new(storage: Storage, admin_ids: HashSet<i64>) -> Self {
        Self { storage, admin_ids }
    }

    /// Vrai si l'identifiant fait partie des admins exemptés
    pub fn is_admin(&self, tg_id: i64) -> bool {
        self.admin_ids.contains(&tg_id)
    }

    /// Tente de consommer un crédit sur un palier précis.
    ///
    /// Admin: toujours vrai, solde inchangé. Sinon: vrai si et seulement
    /// si un crédit a été décrémenté.
    pub async fn try_consume_tier(&self, tg_id: i64, tier: CreditTier) -> AppResult<bool> {
        if self.is_admin(tg_id) {
            debug!("🔓 Bypass crédits pour l'admin {}", tg_id);
            return Ok(true);
        }
        self.storage.consume_credit(tg_id, tier).await
    }

    /// Tente de consommer un crédit: palier gratuit d'abord, pro ensuite
    pub async fn try_consume(&self, tg_id: i64) -> AppResult<bool> {
        if self.is_admin(tg_id) {
            debug!("🔓 Bypass crédits pour l'admin {}", tg_id);
            return Ok(true);
        }
        if self.storage.consume_credit(tg_id, CreditTier::Free).await? {
            return Ok(true);
        }
        self.storage.consume_credit(tg_id, CreditTier::Pro).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn gate_with_user(tg_id: i64, free: i64, admins: &[i64]) -> (Storage, CreditGate) {
        let storage = Storage::connect_in_memory().await.unwrap();
        storage.init().await.unwrap();
        storage.ensure_user(tg_id, free).await.unwrap();
        let gate = CreditGate::new(storage.clone(), admins.iter().copied().collect());
        (storage, gate)
    }

    #[tokio::test]
    async fn zero_balance_rejects_without_mutation() {
        let (storage, gate) = gate_with_user(1, 0, &[]).await;

        assert!(!gate.try_consume(1).await.unwrap());
        assert!(!gate.try_consume_tier(1, CreditTier::Free).await.unwrap());

        let user = storage.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.credits_free, 0);
        assert_eq!(user.credits_pro, 0);
    }

    #[tokio::test]
    async fn admin_bypasses_regardless_of_balance() {
        let (storage, gate) = gate_with_user(99, 0, &[99]).await;

        assert!(gate.try_consume(99).await.unwrap());
        assert!(gate.try_consume_tier(99, CreditTier::Pro).await.unwrap());

        // Le solde n'a pas bougé
        let user = storage.get_user(99).await.unwrap().unwrap();
        assert_eq!(user.credits_total(), 0);
    }

    #[tokio::test]
    async fn free_tier_is_consumed_before_pro() {
        let (storage, gate) = gate_with_user(2, 1, &[]).await;
        storage.add_credits(2, CreditTier::Pro, 1).await.unwrap();

        assert!(gate.try_consume(2).await.unwrap());
        let user = storage.get_user(2).await.unwrap().unwrap();
        assert_eq!(user.credits_free, 0);
        assert_eq!(user.credits_pro, 1);

        assert!(gate.try_consume(2).await.unwrap());
        let user = storage.get_user(2).await.unwrap().unwrap();
        assert_eq!(user.credits_pro, 0);

        assert!(!gate.try_consume(2).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_consumption_of_last_credit_succeeds_once() {
        let (storage, gate) = gate_with_user(3, 1, &[]).await;

        let (first, second) = tokio::join!(gate.try_consume(3), gate.try_consume(3));
        let (first, second) = (first.unwrap(), second.unwrap());

        // Exactement un gagnant, pas de double dépense
        assert!(first ^ second);
        let user = storage.get_user(3).await.unwrap().unwrap();
        assert_eq!(user.credits_total(), 0);
    }
}
