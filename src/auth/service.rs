use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{
    config::AuthConfig,
    error::AuthError,
    models::{
        CheckedToken, NewPassport, NewUser, Passport, Registration, User, UserAttemptsUpdate,
        LOCAL_PROTOCOL,
    },
    password::{generate_access_token, hash_password},
    storage::AccountStore,
    utils::valid_email,
};
use crate::notification::{render, EmailSender, PasswordForgotModel, UserPasswordForgot};

/// Registration and password reset workflows.
///
/// Every workflow awaits each store call before issuing the next one; there
/// is no transaction around a workflow, so a failure part way leaves the
/// earlier writes in place.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    config: AuthConfig,
    mailer: Arc<dyn EmailSender>,
}

/// Oldest creation time a reset token may have and still be accepted.
fn expiry_cutoff(now: DateTime<Utc>, expiration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(expiration)
        .ok()
        .and_then(|ttl| now.checked_sub_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        config: AuthConfig,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            store,
            config,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check the account store is reachable.
    ///
    /// # Errors
    /// Returns the store error when the database cannot be reached.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Create a user, its tag associations and its local passport.
    ///
    /// Tag and passport failures are logged and do not undo the user.
    ///
    /// # Errors
    /// [`AuthError::BlankPassword`] before any write, or
    /// [`AuthError::RegistrationFailed`] when the user row cannot be created.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        if registration.password.is_empty() {
            return Err(AuthError::BlankPassword);
        }

        let now = Utc::now();
        let user = match self
            .store
            .insert_user(NewUser::from_registration(&registration, now))
            .await
        {
            Ok(user) => user,
            Err(err) => {
                warn!("register: failed to create user: {err:#}");
                return Err(AuthError::RegistrationFailed);
            }
        };
        info!(user_id = user.id, "created user");

        for &tag_id in &registration.tags {
            if let Err(err) = self.store.insert_user_tag(user.id, tag_id).await {
                warn!(tag_id, "register: failed to create tag: {err:#}");
            }
        }

        match self.create_passport(user.id, &registration.password).await {
            Ok(passport) => info!(passport_id = passport.id, user_id = user.id, "created passport"),
            Err(err) => error!(user_id = user.id, "register: failed to create passport: {err:#}"),
        }

        Ok(user)
    }

    async fn create_passport(&self, user_id: i64, password: &str) -> Result<Passport> {
        let hashed = hash_password(password, self.config.bcrypt_cost()).await?;
        let access_token = generate_access_token()?;
        self.store
            .insert_passport(NewPassport::local(user_id, hashed, access_token, Utc::now()))
            .await
    }

    /// Issue a password reset token for `username`.
    ///
    /// An unknown username returns `Ok(())` just like a known one so callers
    /// cannot probe for accounts.
    ///
    /// # Errors
    /// [`AuthError::InvalidEmail`] for a malformed username, or
    /// [`AuthError::ForgotPassword`] when the token cannot be stored.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, username: &str) -> Result<(), AuthError> {
        if !valid_email(username) {
            return Err(AuthError::InvalidEmail);
        }

        let user = match self.store.find_user_by_username(username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!("forgot password attempt: no user found for email");
                return Ok(());
            }
            Err(err) => {
                warn!("forgot password attempt: user lookup failed: {err:#}");
                return Ok(());
            }
        };

        let token = Uuid::new_v4().to_string();
        let reset = match self
            .store
            .insert_password_reset(user.id, &token, Utc::now())
            .await
        {
            Ok(reset) => reset,
            Err(err) => {
                error!(user_id = user.id, "error creating password reset record: {err:#}");
                return Err(AuthError::ForgotPassword);
            }
        };

        self.notify_password_forgot(PasswordForgotModel {
            user,
            token: reset.token,
        });

        Ok(())
    }

    fn notify_password_forgot(&self, model: PasswordForgotModel) {
        let delivery = render(&UserPasswordForgot, &model)
            .and_then(|message| self.mailer.send(&message));
        if let Err(err) = delivery {
            warn!(user_id = model.user.id, "failed to send password reset email: {err:#}");
        }
    }

    /// Look up a fresh, unconsumed reset token and its owner.
    ///
    /// # Errors
    /// [`AuthError::TokenLookup`] when the token is unknown, consumed, expired
    /// or the lookup fails; [`AuthError::UserLookup`] when its user is gone.
    #[instrument(skip_all)]
    pub async fn check_token(&self, token: &str) -> Result<CheckedToken, AuthError> {
        let cutoff = expiry_cutoff(Utc::now(), self.config.token_expiration());

        let reset = match self.store.find_valid_password_reset(token, cutoff).await {
            Ok(Some(reset)) => reset,
            Ok(None) => {
                debug!("password reset token not found or expired");
                return Err(AuthError::TokenLookup);
            }
            Err(err) => {
                error!("error looking up password reset token: {err:#}");
                return Err(AuthError::TokenLookup);
            }
        };

        match self.store.find_user(reset.user_id).await {
            Ok(Some(user)) => Ok(CheckedToken {
                reset,
                email: user.username,
            }),
            Ok(None) => {
                warn!(user_id = reset.user_id, "password reset token has no user");
                Err(AuthError::UserLookup)
            }
            Err(err) => {
                error!(user_id = reset.user_id, "error looking up user: {err:#}");
                Err(AuthError::UserLookup)
            }
        }
    }

    /// Replace the user's password using a checked reset token.
    ///
    /// The token is marked consumed and the attempt counter update is built
    /// before any write. Writes then run in order: passport upsert, user
    /// update, token update. The first failure stops the sequence.
    ///
    /// # Errors
    /// [`AuthError::ResetFailed`] when any lookup, hash or write fails.
    #[instrument(skip_all, fields(user_id = token.reset.user_id))]
    pub async fn reset_password(
        &self,
        token: &mut CheckedToken,
        password: &str,
    ) -> Result<(), AuthError> {
        let now = Utc::now();
        token.reset.deleted_at = Some(now);
        token.reset.updated_at = now;

        let user_id = token.reset.user_id;
        let user_update = UserAttemptsUpdate {
            id: user_id,
            password_attempts: 0,
        };

        let existing = self.store.find_passport_by_user(user_id).await.map_err(|err| {
            error!("reset: failed to lookup passport: {err:#}");
            AuthError::ResetFailed
        })?;

        let hashed = hash_password(password, self.config.bcrypt_cost())
            .await
            .map_err(|err| {
                error!("reset: failed to hash password: {err:#}");
                AuthError::ResetFailed
            })?;
        let access_token = generate_access_token().map_err(|err| {
            error!("reset: failed to generate access token: {err:#}");
            AuthError::ResetFailed
        })?;

        let passport = NewPassport {
            id: existing.as_ref().map(|passport| passport.id),
            user_id,
            protocol: LOCAL_PROTOCOL.to_string(),
            password: hashed,
            access_token,
            created_at: existing.map_or(now, |passport| passport.created_at),
            updated_at: now,
        };

        self.store.upsert_passport(passport).await.map_err(|err| {
            warn!(email = %token.email, "reset: failed to create or update passport: {err:#}");
            AuthError::ResetFailed
        })?;

        self.store
            .update_user_attempts(user_update)
            .await
            .map_err(|err| {
                error!("reset: failed to reset password attempts: {err:#}");
                AuthError::ResetFailed
            })?;

        self.store
            .update_password_reset(&token.reset)
            .await
            .map_err(|err| {
                error!("reset: failed to consume reset token: {err:#}");
                AuthError::ResetFailed
            })?;

        info!("password reset");
        Ok(())
    }
}
