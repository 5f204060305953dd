//! In-memory [`AccountStore`] for tests, with switches to make writes fail.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::Mutex;

use super::AccountStore;
use crate::auth::models::{
    NewPassport, NewUser, Passport, PasswordReset, User, UserAttemptsUpdate,
};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: Vec<User>,
    pub(crate) user_tags: Vec<(i64, i64)>,
    pub(crate) passports: Vec<Passport>,
    pub(crate) resets: Vec<PasswordReset>,
    /// Every write in call order, e.g. `"upsert_passport"`.
    pub(crate) writes: Vec<&'static str>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub(crate) struct Failures {
    pub(crate) ping: bool,
    pub(crate) insert_user: bool,
    pub(crate) lookup_user: bool,
    pub(crate) insert_passport: bool,
    pub(crate) upsert_passport: bool,
    pub(crate) insert_password_reset: bool,
    pub(crate) lookup_password_reset: bool,
    pub(crate) tags: HashSet<i64>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) tables: Mutex<Tables>,
    pub(crate) failures: Failures,
}

impl MemoryStore {
    pub(crate) fn with_failures(failures: Failures) -> Self {
        Self {
            tables: Mutex::default(),
            failures,
        }
    }

    /// Seed a user row directly, bypassing the workflows.
    pub(crate) async fn seed_user(&self, username: &str) -> User {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            name: None,
            government_uri: None,
            is_admin: false,
            is_agency_admin: false,
            disabled: false,
            password_attempts: 3,
            completed_tasks: 0,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        user
    }

    /// Seed a reset token with an explicit creation time.
    pub(crate) async fn seed_reset(
        &self,
        user_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> PasswordReset {
        let mut tables = self.tables.lock().await;
        let reset = PasswordReset {
            id: tables.next_id(),
            user_id,
            token: token.to_string(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        tables.resets.push(reset.clone());
        reset
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        if self.failures.ping {
            bail!("database unavailable");
        }
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        if self.failures.insert_user {
            bail!("insert user failed");
        }
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            bail!("duplicate username");
        }
        let created = User {
            id: tables.next_id(),
            username: user.username,
            name: user.name,
            government_uri: user.government_uri,
            is_admin: user.is_admin,
            is_agency_admin: user.is_agency_admin,
            disabled: user.disabled,
            password_attempts: user.password_attempts,
            completed_tasks: user.completed_tasks,
            created_at: user.created_at,
            updated_at: user.updated_at,
        };
        tables.users.push(created.clone());
        tables.writes.push("insert_user");
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        if self.failures.lookup_user {
            bail!("lookup user failed");
        }
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        if self.failures.lookup_user {
            bail!("lookup user failed");
        }
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn update_user_attempts(&self, update: UserAttemptsUpdate) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == update.id)
            .ok_or_else(|| anyhow!("user {} not found", update.id))?;
        user.password_attempts = update.password_attempts;
        tables.writes.push("update_user");
        Ok(())
    }

    async fn insert_user_tag(&self, user_id: i64, tag_id: i64) -> Result<()> {
        if self.failures.tags.contains(&tag_id) {
            bail!("tag {tag_id} does not exist");
        }
        let mut tables = self.tables.lock().await;
        tables.user_tags.push((user_id, tag_id));
        tables.writes.push("insert_user_tag");
        Ok(())
    }

    async fn insert_passport(&self, passport: NewPassport) -> Result<Passport> {
        if self.failures.insert_passport {
            bail!("insert passport failed");
        }
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == passport.user_id) {
            bail!("passport references unknown user {}", passport.user_id);
        }
        let created = Passport {
            id: tables.next_id(),
            user_id: passport.user_id,
            protocol: passport.protocol,
            password: passport.password,
            access_token: passport.access_token,
            created_at: passport.created_at,
            updated_at: passport.updated_at,
        };
        tables.passports.push(created.clone());
        tables.writes.push("insert_passport");
        Ok(created)
    }

    async fn find_passport_by_user(&self, user_id: i64) -> Result<Option<Passport>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .passports
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_passport(&self, passport: NewPassport) -> Result<Passport> {
        if self.failures.upsert_passport {
            bail!("upsert passport failed");
        }
        let mut tables = self.tables.lock().await;
        tables.writes.push("upsert_passport");
        if let Some(existing) = tables
            .passports
            .iter_mut()
            .find(|p| p.user_id == passport.user_id)
        {
            existing.protocol = passport.protocol;
            existing.password = passport.password;
            existing.access_token = passport.access_token;
            existing.updated_at = passport.updated_at;
            return Ok(existing.clone());
        }
        let created = Passport {
            id: tables.next_id(),
            user_id: passport.user_id,
            protocol: passport.protocol,
            password: passport.password,
            access_token: passport.access_token,
            created_at: passport.created_at,
            updated_at: passport.updated_at,
        };
        tables.passports.push(created.clone());
        Ok(created)
    }

    async fn insert_password_reset(
        &self,
        user_id: i64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        if self.failures.insert_password_reset {
            bail!("insert password reset failed");
        }
        let mut tables = self.tables.lock().await;
        let reset = PasswordReset {
            id: tables.next_id(),
            user_id,
            token: token.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.resets.push(reset.clone());
        tables.writes.push("insert_password_reset");
        Ok(reset)
    }

    async fn find_valid_password_reset(
        &self,
        token: &str,
        created_after: DateTime<Utc>,
    ) -> Result<Option<PasswordReset>> {
        if self.failures.lookup_password_reset {
            bail!("lookup password reset failed");
        }
        let tables = self.tables.lock().await;
        Ok(tables
            .resets
            .iter()
            .find(|r| r.token == token && r.created_at > created_after && r.deleted_at.is_none())
            .cloned())
    }

    async fn update_password_reset(&self, reset: &PasswordReset) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .resets
            .iter_mut()
            .find(|r| r.id == reset.id)
            .ok_or_else(|| anyhow!("password reset {} not found", reset.id))?;
        stored.deleted_at = reset.deleted_at;
        stored.updated_at = reset.updated_at;
        tables.writes.push("update_password_reset");
        Ok(())
    }
}
