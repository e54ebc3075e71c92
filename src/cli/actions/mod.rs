pub mod server;

use secrecy::SecretString;

/// Actions the binary can perform after argument parsing.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        token_secret: SecretString,
        max_attempts: u32,
        window_minutes: u64,
        totp_issuer: String,
    },
}
