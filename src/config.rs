use std::env;
use std::path::PathBuf;

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid {0}: {1}")]
    InvalidUrl(&'static str, url::ParseError),
}

/// Everything the process needs, resolved once at startup. Handlers never
/// read the environment themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base endpoint of the hosted Supabase project, no trailing slash.
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub model_dir: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = required("SUPABASE_URL")?;
        let supabase_url = supabase_url.trim_end_matches('/').to_string();
        Url::parse(&supabase_url).map_err(|e| ConfigError::InvalidUrl("SUPABASE_URL", e))?;
        let supabase_service_key = required("SUPABASE_SERVICE_ROLE_KEY")?;

        let model_dir = env::var("MODEL_DIR").unwrap_or_else(|_| "models".to_string());
        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Ok(Self {
            supabase_url,
            supabase_service_key,
            model_dir: PathBuf::from(model_dir),
            static_dir: PathBuf::from(static_dir),
            port,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_clean_env<T>(f: impl FnOnce() -> T) -> T {
        // Config tests mutate process-wide env vars, so they share one lock.
        static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
        let _guard = LOCK.lock().unwrap();
        for var in [
            "SUPABASE_URL",
            "SUPABASE_SERVICE_ROLE_KEY",
            "PORT",
            "MODEL_DIR",
            "STATIC_DIR",
        ] {
            unsafe { env::remove_var(var) };
        }
        f()
    }

    #[test]
    fn missing_url_is_an_error() {
        with_clean_env(|| {
            unsafe { env::set_var("SUPABASE_SERVICE_ROLE_KEY", "secret") };
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::MissingVar("SUPABASE_URL")));
        });
    }

    #[test]
    fn missing_key_is_an_error() {
        with_clean_env(|| {
            unsafe { env::set_var("SUPABASE_URL", "https://abc.supabase.co") };
            let err = AppConfig::from_env().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::MissingVar("SUPABASE_SERVICE_ROLE_KEY")
            ));
        });
    }

    #[test]
    fn trailing_slash_is_stripped_and_defaults_apply() {
        with_clean_env(|| {
            unsafe {
                env::set_var("SUPABASE_URL", "https://abc.supabase.co/");
                env::set_var("SUPABASE_SERVICE_ROLE_KEY", "secret");
            }
            let config = AppConfig::from_env().unwrap();
            assert_eq!(config.supabase_url, "https://abc.supabase.co");
            assert_eq!(config.port, 8000);
            assert_eq!(config.model_dir, PathBuf::from("models"));
        });
    }
}
