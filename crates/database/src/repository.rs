use crate::DbError;
use chrono::{DateTime, Utc};
use core_types::{MarketDataRecord, NewMarketData, UserAccount};
use sqlx::sqlite::SqlitePool;

const MARKET_DATA_COLUMNS: &str =
    "id, user_id, market_price, harvest_amount, total_cost, total_revenue, net_profit, timestamp";
const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // --- Market data ---

    /// Every submission, oldest first. This is the snapshot the prediction engine consumes.
    pub async fn list_market_data(&self) -> Result<Vec<MarketDataRecord>, DbError> {
        sqlx::query_as::<_, MarketDataRecord>(&format!(
            "SELECT {MARKET_DATA_COLUMNS} FROM market_data ORDER BY timestamp ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Read)
    }

    pub async fn list_market_data_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<MarketDataRecord>, DbError> {
        sqlx::query_as::<_, MarketDataRecord>(&format!(
            "SELECT {MARKET_DATA_COLUMNS} FROM market_data WHERE user_id = ?1 ORDER BY timestamp ASC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Read)
    }

    /// Stores a validated submission and returns its id. The timestamp is assigned here.
    pub async fn append_market_data(
        &self,
        data: &NewMarketData,
        user_id: Option<i64>,
    ) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO market_data
                (user_id, market_price, harvest_amount, total_cost, total_revenue, net_profit, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(user_id)
        .bind(data.market_price)
        .bind(data.harvest_amount)
        .bind(data.total_cost)
        .bind(data.total_revenue)
        .bind(data.net_profit)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::Write)?;

        Ok(result.last_insert_rowid())
    }

    /// Deletes all submissions of one user and returns how many rows went.
    pub async fn clear_market_data_for_user(&self, user_id: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM market_data WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::Write)?;
        Ok(result.rows_affected())
    }

    // --- Users ---

    /// Inserts a new account. A taken username or email is `DbError::Conflict`.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserAccount, DbError> {
        sqlx::query_as::<_, UserAccount>(&format!(
            "INSERT INTO users (username, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<UserAccount>, DbError> {
        sqlx::query_as::<_, UserAccount>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Read)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<UserAccount>, DbError> {
        sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Read)
    }

    /// Emails are matched case-insensitively.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, DbError> {
        sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Read)
    }

    /// Replaces a user's password hash and signs out every other session of theirs.
    ///
    /// `keep_session` is the token hash of the session making the change, if any.
    pub async fn update_password(
        &self,
        user_id: i64,
        password_hash: &str,
        keep_session: Option<&str>,
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Write)?;

        let updated = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::Write)?;
        if updated.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        sqlx::query("DELETE FROM sessions WHERE user_id = ?1 AND token_hash IS NOT ?2")
            .bind(user_id)
            .bind(keep_session)
            .execute(&mut *tx)
            .await
            .map_err(DbError::Write)?;

        tx.commit().await.map_err(DbError::Write)?;
        Ok(())
    }

    // --- Sessions ---

    pub async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DbError::from_write)?;
        Ok(())
    }

    /// Resolves a session to its user, ignoring sessions that expired before `now`.
    pub async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserAccount>, DbError> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.created_at
            FROM sessions AS s
            JOIN users AS u ON u.id = s.user_id
            WHERE s.token_hash = ?1 AND s.expires_at > ?2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Read)
    }

    pub async fn delete_session(&self, token_hash: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(DbError::Write)?;
        Ok(())
    }

    /// Removes sessions that expired at or before `now`; returns how many.
    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DbError::Write)?;
        Ok(result.rows_affected())
    }
}
