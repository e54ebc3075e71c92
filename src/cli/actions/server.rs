use crate::{api, auth::AuthConfig, cli::actions::Action};
use anyhow::Result;

/// Handle the server action
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server fails to
/// start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_secret,
            max_attempts,
            window_minutes,
            totp_issuer,
        } => {
            // Configuration problems are fatal before binding the listener.
            let config = AuthConfig::new(token_secret, max_attempts, window_minutes)?
                .with_totp_issuer(totp_issuer);

            api::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
