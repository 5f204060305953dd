use crate::{
    api::{self, HttpConfig},
    auth::AuthConfig,
};
use anyhow::{anyhow, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub db_password: Option<SecretString>,
    pub token_expiration_seconds: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub secure_cookies: bool,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new()
            .with_token_expiration_seconds(self.token_expiration_seconds)
            .with_bcrypt_cost(self.bcrypt_cost)
    }

    fn http_config(&self) -> HttpConfig {
        HttpConfig::new()
            .with_cors_origins(self.cors_origins.clone())
            .with_body_limit_bytes(self.body_limit_bytes)
            .with_secure_cookies(self.secure_cookies)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let dsn = dsn_with_password(&args.dsn, args.db_password.as_ref())?;

    api::new(args.port, dsn, args.auth_config(), args.http_config()).await
}

fn dsn_with_password(dsn: &str, password: Option<&SecretString>) -> Result<String> {
    let Some(password) = password else {
        return Ok(dsn.to_string());
    };

    let mut dsn = Url::parse(dsn)?;

    dsn.set_password(Some(password.expose_secret()))
        .map_err(|()| anyhow!("Error setting password"))?;

    Ok(dsn.to_string())
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("db_password_set", args.db_password.is_some().to_string()),
        (
            "token_expiration_seconds",
            args.token_expiration_seconds.to_string(),
        ),
        ("bcrypt_cost", args.bcrypt_cost.to_string()),
        ("cors_origins", args.cors_origins.join(",")),
        ("body_limit_bytes", args.body_limit_bytes.to_string()),
        ("secure_cookies", args.secure_cookies.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "openopps {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
