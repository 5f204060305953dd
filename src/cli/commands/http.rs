use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_CORS_ORIGIN: &str = "cors-origin";
pub const ARG_BODY_LIMIT_BYTES: &str = "body-limit-bytes";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub secure_cookies: bool,
}

impl Options {
    /// Parse HTTP middleware arguments from matches.
    ///
    /// # Errors
    /// Returns an error if an argument is missing or a CORS origin is blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let cors_origins: Vec<String> = matches
            .get_many::<String>(ARG_CORS_ORIGIN)
            .map(|values| values.map(|value| value.trim().to_string()).collect())
            .unwrap_or_default();
        if cors_origins.iter().any(String::is_empty) {
            anyhow::bail!("invalid argument: --{ARG_CORS_ORIGIN} may not be blank");
        }

        Ok(Self {
            cors_origins,
            body_limit_bytes: matches
                .get_one::<usize>(ARG_BODY_LIMIT_BYTES)
                .copied()
                .ok_or_else(|| {
                    anyhow::anyhow!("missing required argument: --{ARG_BODY_LIMIT_BYTES}")
                })?,
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long(ARG_CORS_ORIGIN)
                .help("Allowed CORS origin, repeat or comma separate for several; * allows any")
                .env("OPENOPPS_CORS_ORIGIN")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_value("*"),
        )
        .arg(
            Arg::new(ARG_BODY_LIMIT_BYTES)
                .long(ARG_BODY_LIMIT_BYTES)
                .help("Maximum request body size in bytes")
                .env("OPENOPPS_BODY_LIMIT_BYTES")
                .default_value("1048576")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark the flash session cookie as Secure")
                .env("OPENOPPS_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
}
