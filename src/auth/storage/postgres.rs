use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::{info_span, Instrument, Span};

use super::AccountStore;
use crate::auth::models::{
    NewPassport, NewUser, Passport, PasswordReset, User, UserAttemptsUpdate,
};

const USER_COLUMNS: &str = "id, username, name, government_uri, is_admin, is_agency_admin, \
    disabled, password_attempts, completed_tasks, created_at, updated_at";

const PASSPORT_COLUMNS: &str =
    "id, user_id, protocol, password, access_token, created_at, updated_at";

const RESET_COLUMNS: &str = "id, user_id, token, created_at, updated_at, deleted_at";

/// Postgres-backed [`AccountStore`].
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &'static str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        government_uri: row.try_get("government_uri")?,
        is_admin: row.try_get("is_admin")?,
        is_agency_admin: row.try_get("is_agency_admin")?,
        disabled: row.try_get("disabled")?,
        password_attempts: row.try_get("password_attempts")?,
        completed_tasks: row.try_get("completed_tasks")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn passport_from_row(row: &PgRow) -> Result<Passport> {
    Ok(Passport {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        protocol: row.try_get("protocol")?,
        password: row.try_get("password")?,
        access_token: row.try_get("access_token")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn reset_from_row(row: &PgRow) -> Result<PasswordReset> {
    Ok(PasswordReset {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        token: row.try_get("token")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl AccountStore for PgStore {
    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let query = format!(
            r"
            INSERT INTO users
                (username, name, government_uri, is_admin, is_agency_admin, disabled,
                 password_attempts, completed_tasks, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.government_uri)
            .bind(user.is_admin)
            .bind(user.is_agency_admin)
            .bind(user.disabled)
            .bind(user.password_attempts)
            .bind(user.completed_tasks)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .context("failed to insert user")?;

        user_from_row(&row)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup user")?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup user by username")?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user_attempts(&self, update: UserAttemptsUpdate) -> Result<()> {
        let query = r"
            UPDATE users
            SET password_attempts = $2,
                updated_at = NOW()
            WHERE id = $1
        ";
        sqlx::query(query)
            .bind(update.id)
            .bind(update.password_attempts)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update user password attempts")?;

        Ok(())
    }

    async fn insert_user_tag(&self, user_id: i64, tag_id: i64) -> Result<()> {
        let query = "INSERT INTO user_tags (user_id, tag_id) VALUES ($1, $2)";
        sqlx::query(query)
            .bind(user_id)
            .bind(tag_id)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert user tag")?;

        Ok(())
    }

    async fn insert_passport(&self, passport: NewPassport) -> Result<Passport> {
        let query = format!(
            r"
            INSERT INTO passports
                (user_id, protocol, password, access_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PASSPORT_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(passport.user_id)
            .bind(&passport.protocol)
            .bind(&passport.password)
            .bind(&passport.access_token)
            .bind(passport.created_at)
            .bind(passport.updated_at)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .context("failed to insert passport")?;

        passport_from_row(&row)
    }

    async fn find_passport_by_user(&self, user_id: i64) -> Result<Option<Passport>> {
        let query = format!("SELECT {PASSPORT_COLUMNS} FROM passports WHERE user_id = $1");
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup passport")?;

        row.as_ref().map(passport_from_row).transpose()
    }

    async fn upsert_passport(&self, passport: NewPassport) -> Result<Passport> {
        // passports.user_id is unique, so it doubles as the conflict target.
        let query = format!(
            r"
            INSERT INTO passports
                (user_id, protocol, password, access_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET protocol = EXCLUDED.protocol,
                password = EXCLUDED.password,
                access_token = EXCLUDED.access_token,
                updated_at = EXCLUDED.updated_at
            RETURNING {PASSPORT_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(passport.user_id)
            .bind(&passport.protocol)
            .bind(&passport.password)
            .bind(&passport.access_token)
            .bind(passport.created_at)
            .bind(passport.updated_at)
            .fetch_one(&self.pool)
            .instrument(query_span("UPSERT", &query))
            .await
            .context("failed to upsert passport")?;

        passport_from_row(&row)
    }

    async fn insert_password_reset(
        &self,
        user_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        let query = format!(
            r"
            INSERT INTO password_resets (user_id, token, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING {RESET_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(token)
            .bind(now)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .context("failed to insert password reset")?;

        reset_from_row(&row)
    }

    async fn find_valid_password_reset(
        &self,
        token: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>> {
        let query = format!(
            r"
            SELECT {RESET_COLUMNS}
            FROM password_resets
            WHERE token = $1
              AND created_at > $2
              AND deleted_at IS NULL
            "
        );
        let row = sqlx::query(&query)
            .bind(token)
            .bind(created_after)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to lookup password reset")?;

        row.as_ref().map(reset_from_row).transpose()
    }

    async fn update_password_reset(&self, reset: &PasswordReset) -> Result<()> {
        let query = r"
            UPDATE password_resets
            SET deleted_at = $2,
                updated_at = $3
            WHERE id = $1
        ";
        sqlx::query(query)
            .bind(reset.id)
            .bind(reset.deleted_at)
            .bind(reset.updated_at)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update password reset")?;

        Ok(())
    }
}
