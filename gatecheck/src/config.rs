//! Application configuration loaded from environment variables.

use std::path::PathBuf;

/// SMTP delivery settings; absent when email should only be logged.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root for template assets (background images).
    pub data_dir: PathBuf,
    /// Directory of `.ttf`/`.otf` files for text overlays.
    pub fonts_dir: PathBuf,
    /// Where generated ticket images are written.
    pub tickets_dir: PathBuf,
    pub smtp: Option<SmtpConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            fonts_dir: data_dir.join("fonts"),
            tickets_dir: data_dir.join("tickets"),
            data_dir,
            smtp: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Supported env vars:
    /// - `GATECHECK_DATA_DIR` (default `./data`; fonts and ticket output
    ///   live underneath unless overridden)
    /// - `GATECHECK_FONTS_DIR`, `GATECHECK_TICKETS_DIR`
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`,
    ///   `SMTP_FROM` (SMTP enabled only when host and from are both set)
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("GATECHECK_DATA_DIR")
            && !dir.trim().is_empty()
        {
            config.data_dir = PathBuf::from(&dir);
            config.fonts_dir = config.data_dir.join("fonts");
            config.tickets_dir = config.data_dir.join("tickets");
        }
        if let Ok(dir) = std::env::var("GATECHECK_FONTS_DIR")
            && !dir.trim().is_empty()
        {
            config.fonts_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("GATECHECK_TICKETS_DIR")
            && !dir.trim().is_empty()
        {
            config.tickets_dir = PathBuf::from(dir);
        }

        let host = std::env::var("SMTP_HOST").ok().filter(|v| !v.is_empty());
        let from = std::env::var("SMTP_FROM").ok().filter(|v| !v.is_empty());
        if let (Some(host), Some(from_address)) = (host, from) {
            let port = std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587);
            config.smtp = Some(SmtpConfig {
                host,
                port,
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                from_address,
            });
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_nest_under_data_dir() {
        let config = AppConfig::default();
        assert_eq!(config.fonts_dir, PathBuf::from("data/fonts"));
        assert_eq!(config.tickets_dir, PathBuf::from("data/tickets"));
        assert!(config.smtp.is_none());
    }
}
