

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::domain::user::{CreditTier, User};
use crate::infrastructure::error::{AppError, AppResult};

/// Accès SQLite pour les utilisateurs et leurs soldes de crédits.
///
/// Seul état mutable partagé entre les requêtes; toute mutation de solde
/// passe par un unique UPDATE conditionnel.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Ouvre (ou crée) la base sur disque
    pub async fn connect(db_path: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("✅ Base SQLite ouverte: {}", db_path);
        Ok(Self { pool })
    }

    /// Base en mémoire, pour les tests
    pub async fn connect_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Crée le schéma si nécessaire
    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                tg_id        INTEGER PRIMARY KEY,
                credits_free INTEGER NOT NULL DEFAULT 0,
                credits_pro  INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Récupère un utilisateur par son identifiant Telegram
    pub async fn get_user(&self, tg_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT tg_id, credits_free, credits_pro, created_at, updated_at
            FROM users
            WHERE tg_id = ?1
            "#,
        )
        .bind(tg_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Crée l'utilisateur au premier contact avec sa dotation de crédits
    /// gratuits; idempotent pour un utilisateur déjà connu.
    pub async fn ensure_user(&self, tg_id: i64, initial_free_credits: i64) -> AppResult<User> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (tg_id, credits_free, credits_pro, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?3)
            "#,
        )
        .bind(tg_id)
        .bind(initial_free_credits)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_user(tg_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Utilisateur".to_string()))
    }

    /// Ajoute des crédits sur un palier
    pub async fn add_credits(&self, tg_id: i64, tier: CreditTier, amount: i64) -> AppResult<()> {
        let sql = format!(
            "UPDATE users SET {col} = {col} + ?1, updated_at = ?2 WHERE tg_id = ?3",
            col = tier.column()
        );
        let result = sqlx::query(&sql)
            .bind(amount)
            .bind(Utc::now())
            .bind(tg_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Utilisateur".to_string()));
        }
        Ok(())
    }

    /// Décrémente un crédit sur un palier si le solde le permet.
    ///
    /// Un seul UPDATE conditionnel: au plus un décrément par appel, même
    /// sous requêtes concurrentes sur le même utilisateur. Le solde ne
    /// devient jamais négatif.
    pub async fn consume_credit(&self, tg_id: i64, tier: CreditTier) -> AppResult<bool> {
        let sql = format!(
            "UPDATE users SET {col} = {col} - 1, updated_at = ?1 WHERE tg_id = ?2 AND {col} > 0",
            col = tier.column()
        );
        let result = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(tg_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> Storage {
        let storage = Storage::connect_in_memory().await.unwrap();
        storage.init().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let storage = test_storage().await;

        let created = storage.ensure_user(42, 3).await.unwrap();
        assert_eq!(created.credits_free, 3);
        assert_eq!(created.credits_pro, 0);

        // Un second contact ne redistribue pas la dotation
        storage.consume_credit(42, CreditTier::Free).await.unwrap();
        let again = storage.ensure_user(42, 3).await.unwrap();
        assert_eq!(again.credits_free, 2);
    }

    #[tokio::test]
    async fn consume_credit_stops_at_zero() {
        let storage = test_storage().await;
        storage.ensure_user(7, 1).await.unwrap();

        assert!(storage.consume_credit(7, CreditTier::Free).await.unwrap());
        assert!(!storage.consume_credit(7, CreditTier::Free).await.unwrap());

        let user = storage.get_user(7).await.unwrap().unwrap();
        assert_eq!(user.credits_free, 0);
    }

    #[tokio::test]
    async fn tiers_are_independent() {
        let storage = test_storage().await;
        storage.ensure_user(9, 0).await.unwrap();
        storage.add_credits(9, CreditTier::Pro, 2).await.unwrap();

        assert!(!storage.consume_credit(9, CreditTier::Free).await.unwrap());
        assert!(storage.consume_credit(9, CreditTier::Pro).await.unwrap());

        let user = storage.get_user(9).await.unwrap().unwrap();
        assert_eq!(user.credits_free, 0);
        assert_eq!(user.credits_pro, 1);
    }

    #[tokio::test]
    async fn add_credits_requires_existing_user() {
        let storage = test_storage().await;
        let result = storage.add_credits(404, CreditTier::Free, 1).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn connect_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("bot.db");

        let storage = Storage::connect(db_path.to_str().unwrap()).await.unwrap();
        storage.init().await.unwrap();
        storage.ensure_user(1, 1).await.unwrap();

        assert!(db_path.exists());
    }
}
