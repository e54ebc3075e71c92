use crate::cli::{actions::Action, commands};
use anyhow::{anyhow, Result};
use secrecy::SecretString;

/// Build the typed action from parsed arguments.
///
/// # Errors
///
/// Returns an error if a required argument is missing, which only happens
/// when clap validation was bypassed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let required_string = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .map(String::to_string)
            .ok_or_else(|| anyhow!("missing required argument: --{name}"))
    };

    Ok(Action::Server {
        port: matches
            .get_one::<u16>(commands::ARG_PORT)
            .copied()
            .unwrap_or(8080),
        dsn: required_string(commands::ARG_DSN)?,
        token_secret: SecretString::from(required_string(commands::ARG_TOKEN_SECRET)?),
        max_attempts: matches
            .get_one::<u32>(commands::ARG_LOGIN_ATTEMPTS)
            .copied()
            .ok_or_else(|| anyhow!("missing required argument: --login-attempts"))?,
        window_minutes: matches
            .get_one::<u64>(commands::ARG_LOGIN_WINDOW)
            .copied()
            .ok_or_else(|| anyhow!("missing required argument: --login-window"))?,
        totp_issuer: required_string(commands::ARG_TOTP_ISSUER)?,
    })
}
