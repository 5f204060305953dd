use clap::{Arg, ArgMatches, Command};

pub const ARG_TOKEN_EXPIRATION_SECONDS: &str = "token-expiration-seconds";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub token_expiration_seconds: u64,
    pub bcrypt_cost: u32,
}

impl Options {
    /// Parse account workflow arguments from matches.
    ///
    /// # Errors
    /// Returns an error if an argument is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        Ok(Self {
            token_expiration_seconds: matches
                .get_one::<u64>(ARG_TOKEN_EXPIRATION_SECONDS)
                .copied()
                .ok_or_else(|| {
                    anyhow::anyhow!("missing required argument: --{ARG_TOKEN_EXPIRATION_SECONDS}")
                })?,
            bcrypt_cost: matches
                .get_one::<u32>(ARG_BCRYPT_COST)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_BCRYPT_COST}"))?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_EXPIRATION_SECONDS)
                .long(ARG_TOKEN_EXPIRATION_SECONDS)
                .help("Password reset token lifetime in seconds")
                .env("OPENOPPS_TOKEN_EXPIRATION_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor for password hashes (4-31)")
                .env("OPENOPPS_BCRYPT_COST")
                .default_value("10")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
}
