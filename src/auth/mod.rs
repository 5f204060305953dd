//! Account registration and password reset.
//!
//! ## Records
//!
//! A `User` owns exactly one local `Passport` (bcrypt hash plus a random
//! access token). Password reset tokens are UUIDs stored in
//! `password_resets`; a token is valid while unconsumed (`deleted_at` is null)
//! and younger than the configured expiration.
//!
//! ## Enumeration resistance
//!
//! `forgot_password` answers the same way whether or not the username exists.

mod config;
mod error;
pub mod models;
pub mod password;
mod service;
pub mod storage;
pub(crate) mod utils;

pub use config::AuthConfig;
pub use error::AuthError;
pub use password::{validate_password, PolicyViolation};
pub use service::AuthService;
pub use storage::{AccountStore, PgStore};
