//! Runtime configuration, loaded from environment variables.

/// Service configuration.
///
/// - `RESERVOIR_ADMIN_KEY`: the shared secret unlocking the owner capability.
///   Falls back to `"admin"`, matching the original deployment default. This
///   is a convenience gate for a single-operator site, not an auth system.
/// - `RESERVOIR_DB`: path to the store file. Unset means the platform data
///   directory.
#[derive(Clone, Debug)]
pub struct Config {
    pub admin_key: String,
    pub db_path: Option<std::path::PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let admin_key =
            std::env::var("RESERVOIR_ADMIN_KEY").unwrap_or_else(|_| "admin".to_string());
        let db_path = std::env::var("RESERVOIR_DB").ok().map(Into::into);
        Self { admin_key, db_path }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
