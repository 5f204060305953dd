//! Data access for users, passports, tags and password reset tokens.
//!
//! The workflows in [`crate::auth::AuthService`] only talk to the
//! [`AccountStore`] trait. [`PgStore`] is the production implementation;
//! tests use an in-memory store with failure injection.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{NewPassport, NewUser, Passport, PasswordReset, User, UserAttemptsUpdate};

#[cfg(test)]
pub(crate) mod memory;
mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Check the backing database is reachable.
    async fn ping(&self) -> Result<()>;

    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn update_user_attempts(&self, update: UserAttemptsUpdate) -> Result<()>;

    async fn insert_user_tag(&self, user_id: i64, tag_id: i64) -> Result<()>;

    async fn insert_passport(&self, passport: NewPassport) -> Result<Passport>;

    async fn find_passport_by_user(&self, user_id: i64) -> Result<Option<Passport>>;

    /// Rewrite the user's passport, or create it when none exists.
    async fn upsert_passport(&self, passport: NewPassport) -> Result<Passport>;

    async fn insert_password_reset(
        &self,
        user_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordReset>;

    /// Find an unconsumed reset token created strictly after `created_after`.
    async fn find_valid_password_reset(
        &self,
        token: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>>;

    /// Persist the consumed marker and `updated_at` of a reset token.
    async fn update_password_reset(&self, reset: &PasswordReset) -> Result<()>;
}
