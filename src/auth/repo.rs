use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::repo_types::{Otp, OtpPurpose, User};
use crate::db::PgStore;

/// Fields for a new account row.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub is_active: bool,
}

/// Persistence for accounts, their profiles and OTP codes.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Creates the user and its profile. `None` when the email is already taken.
    async fn create_user(&self, new: NewUser<'_>) -> anyhow::Result<Option<User>>;
    async fn activate_user(&self, id: Uuid) -> anyhow::Result<()>;
    /// Sets the password hash and drops every outstanding `password_reset` code.
    async fn replace_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
    /// Activates a pending account for a verified identity: replaces the password hash,
    /// overwrites the profile name and drops every outstanding code.
    async fn claim_pending_account(
        &self,
        id: Uuid,
        password_hash: &str,
        full_name: &str,
    ) -> anyhow::Result<()>;
    async fn ensure_profile(&self, user_id: Uuid, full_name: &str) -> anyhow::Result<()>;
    async fn profile_full_name(&self, user_id: Uuid) -> anyhow::Result<Option<String>>;
    async fn insert_otp(&self, otp: &Otp) -> anyhow::Result<()>;
    /// Most recently created code matching all three keys.
    async fn latest_otp(
        &self,
        user_id: Uuid,
        code: &str,
        purpose: OtpPurpose,
    ) -> anyhow::Result<Option<Otp>>;
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, is_active)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, is_active, created_at
            "#,
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.is_active)
        .fetch_optional(&mut *tx)
        .await
        .context("insert user")?;

        let Some(user) = user else {
            return Ok(None);
        };

        sqlx::query(r#"INSERT INTO user_profiles (user_id, full_name) VALUES ($1, $2)"#)
            .bind(user.id)
            .bind(new.full_name)
            .execute(&mut *tx)
            .await
            .context("insert profile")?;

        tx.commit().await.context("commit tx")?;
        Ok(Some(user))
    }

    async fn activate_user(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET is_active = TRUE WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("activate user")?;
        Ok(())
    }

    async fn replace_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .context("update password")?;
        sqlx::query(r#"DELETE FROM otps WHERE user_id = $1 AND purpose = $2"#)
            .bind(id)
            .bind(OtpPurpose::PasswordReset)
            .execute(&mut *tx)
            .await
            .context("delete reset otps")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn claim_pending_account(
        &self,
        id: Uuid,
        password_hash: &str,
        full_name: &str,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        sqlx::query(r#"UPDATE users SET is_active = TRUE, password_hash = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .context("claim user")?;
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, full_name)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
               SET full_name = EXCLUDED.full_name, updated_at = now()
            "#,
        )
        .bind(id)
        .bind(full_name)
        .execute(&mut *tx)
        .await
        .context("reset profile name")?;
        sqlx::query(r#"DELETE FROM otps WHERE user_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete otps")?;
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn ensure_profile(&self, user_id: Uuid, full_name: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, full_name)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .execute(&self.pool)
        .await
        .context("ensure profile")?;
        Ok(())
    }

    async fn profile_full_name(&self, user_id: Uuid) -> anyhow::Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>(
            r#"SELECT full_name FROM user_profiles WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("profile full name")?;
        Ok(name)
    }

    async fn insert_otp(&self, otp: &Otp) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otps (id, user_id, code, purpose, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(otp.id)
        .bind(otp.user_id)
        .bind(&otp.code)
        .bind(otp.purpose)
        .bind(otp.created_at)
        .bind(otp.expires_at)
        .execute(&self.pool)
        .await
        .context("insert otp")?;
        Ok(())
    }

    async fn latest_otp(
        &self,
        user_id: Uuid,
        code: &str,
        purpose: OtpPurpose,
    ) -> anyhow::Result<Option<Otp>> {
        let otp = sqlx::query_as::<_, Otp>(
            r#"
            SELECT id, user_id, code, purpose, created_at, expires_at
              FROM otps
             WHERE user_id = $1 AND code = $2 AND purpose = $3
             ORDER BY created_at DESC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await
        .context("latest otp")?;
        Ok(otp)
    }
}
