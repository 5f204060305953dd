//! Account registration and password reset service.
//!
//! - [`auth`]: password policy, registration, forgot/reset workflows and the
//!   account store.
//! - [`notification`]: email templates and delivery.
//! - [`api`]: HTTP routes and middleware.
//! - [`cli`]: command line parsing, telemetry and the server action.

pub mod api;
pub mod auth;
pub mod cli;
pub mod notification;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
